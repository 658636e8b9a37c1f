//! Classifying an attack opportunity against a walled target

use crate::core::config::EngineConfig;
use crate::world::location::MAX_FORTIFICATION;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiegeDecision {
    /// Walls won't count: march straight in
    Capture,
    /// Enough troops on hand to lay siege
    Siege,
    /// Worth besieging once more troops are raised
    RecruitThenSiege,
    /// Too dangerous or too expensive
    Skip,
}

/// Decide how to approach a target
///
/// `garrison` is the estimated defending strength, `troops` what the
/// faction can bring, `gold` its current treasury.
pub fn classify_siege(config: &EngineConfig, fortification: u8, garrison: u32, troops: u32, gold: u32) -> SiegeDecision {
    // A sortie would wreck the besiegers
    if troops == 0 || garrison as f64 >= config.sortie_risk_ratio * troops as f64 {
        return SiegeDecision::Skip;
    }
    if fortification >= MAX_FORTIFICATION && gold < config.wealth_gate_top_tier {
        return SiegeDecision::Skip;
    }
    if fortification == 0 || garrison < config.fortification_threshold {
        return SiegeDecision::Capture;
    }
    if troops >= config.siege_requirement(fortification) {
        SiegeDecision::Siege
    } else {
        SiegeDecision::RecruitThenSiege
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let config = EngineConfig::default();
        assert_eq!(classify_siege(&config, 2, 400, 600, 0), SiegeDecision::Capture);
        assert_eq!(classify_siege(&config, 0, 900, 600, 0), SiegeDecision::Capture);
        assert_eq!(classify_siege(&config, 3, 900, 1000, 0), SiegeDecision::Siege);
        assert_eq!(classify_siege(&config, 3, 900, 800, 0), SiegeDecision::RecruitThenSiege);
    }

    #[test]
    fn test_sortie_risk_skips() {
        let config = EngineConfig::default();
        assert_eq!(classify_siege(&config, 1, 1200, 600, 5000), SiegeDecision::Skip);
        assert_eq!(classify_siege(&config, 1, 1199, 600, 5000), SiegeDecision::Siege);
        assert_eq!(classify_siege(&config, 1, 100, 0, 5000), SiegeDecision::Skip);
    }

    #[test]
    fn test_wealth_gate_for_top_tier() {
        let config = EngineConfig::default();
        assert_eq!(classify_siege(&config, 4, 600, 2000, 1499), SiegeDecision::Skip);
        assert_eq!(classify_siege(&config, 4, 600, 2000, 1500), SiegeDecision::Siege);
    }
}
