use super::entity::Team;

/// Converts damage dealt into currency. At most `max_conversions` units are
/// minted per tick; whatever is not converted stays banked for later ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageBank {
    banked: f32,
    threshold: f32,
    max_conversions: u32,
}

impl DamageBank {
    pub fn new(threshold: f32, max_conversions: u32) -> Self {
        Self {
            banked: 0.0,
            threshold,
            max_conversions,
        }
    }

    pub fn banked(&self) -> f32 {
        self.banked
    }

    /// Deposits one tick's worth of damage and returns the currency minted.
    pub fn deposit(&mut self, damage: f32) -> u32 {
        if damage > 0.0 {
            self.banked += damage;
        }

        let mut minted = 0;
        while minted < self.max_conversions && self.banked >= self.threshold {
            self.banked -= self.threshold;
            minted += 1;
        }
        minted
    }

    pub fn reset(&mut self) {
        self.banked = 0.0;
    }
}

#[derive(Debug, Clone)]
pub struct Economy {
    banks: [DamageBank; 2],
    currency: [u32; 2],
    starting_currency: u32,
}

impl Economy {
    pub fn new(threshold: f32, max_conversions: u32, starting_currency: u32) -> Self {
        let bank = DamageBank::new(threshold, max_conversions);
        Self {
            banks: [bank, bank],
            currency: [starting_currency; 2],
            starting_currency,
        }
    }

    pub fn currency(&self, team: Team) -> u32 {
        self.currency[team.index()]
    }

    pub fn bank(&self, team: Team) -> &DamageBank {
        &self.banks[team.index()]
    }

    pub fn credit_damage(&mut self, team: Team, damage: f32) -> u32 {
        let minted = self.banks[team.index()].deposit(damage);
        self.currency[team.index()] += minted;
        minted
    }

    pub fn try_spend(&mut self, team: Team, amount: u32) -> bool {
        let funds = &mut self.currency[team.index()];
        if *funds < amount {
            return false;
        }
        *funds -= amount;
        true
    }

    pub fn reset(&mut self) {
        for bank in &mut self.banks {
            bank.reset();
        }
        self.currency = [self.starting_currency; 2];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forty_five_damage_across_ticks() {
        let mut economy = Economy::new(20.0, 2, 0);

        let mut minted = 0;
        for damage in [10.0, 10.0, 10.0, 15.0] {
            minted += economy.credit_damage(Team::Host, damage);
        }

        assert_eq!(minted, 2);
        assert_eq!(economy.currency(Team::Host), 2);
        assert!((economy.bank(Team::Host).banked() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn burst_is_capped_per_tick() {
        let mut bank = DamageBank::new(20.0, 2);

        assert_eq!(bank.deposit(65.0), 2);
        assert!((bank.banked() - 25.0).abs() < 1e-4);
        assert_eq!(bank.deposit(0.0), 1);
        assert!((bank.banked() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn teams_are_independent() {
        let mut economy = Economy::new(20.0, 2, 10);
        economy.credit_damage(Team::Joiner, 40.0);

        assert_eq!(economy.currency(Team::Host), 10);
        assert_eq!(economy.currency(Team::Joiner), 12);
    }

    #[test]
    fn spending() {
        let mut economy = Economy::new(20.0, 2, 3);
        assert!(economy.try_spend(Team::Host, 2));
        assert!(!economy.try_spend(Team::Host, 2));
        assert_eq!(economy.currency(Team::Host), 1);

        economy.reset();
        assert_eq!(economy.currency(Team::Host), 3);
    }
}
