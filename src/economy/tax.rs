//! Tax level choice for non-human factions

use crate::actions::Action;
use crate::core::types::FactionId;
use crate::world::{GameState, TaxLevel};

/// Treasury below which the AI squeezes a little harder
const TREASURY_PRESSURE: u32 = 200;

/// Stability-driven tax level, one step higher when the treasury is thin
pub fn choose_tax_level(stability: u32, treasury_pressure: bool) -> TaxLevel {
    let level = match stability {
        0..=29 => return TaxLevel::None,
        30..=44 => TaxLevel::Low,
        45..=64 => TaxLevel::Normal,
        65..=84 => TaxLevel::High,
        _ => TaxLevel::VeryHigh,
    };
    if treasury_pressure {
        level.raised()
    } else {
        level
    }
}

pub fn optimize_taxes(state: &GameState, faction: FactionId) -> Vec<Action> {
    let pressure = state.gold(faction) < TREASURY_PRESSURE;
    state
        .locations
        .iter()
        .filter(|l| l.faction == faction)
        .filter_map(|l| {
            let level = choose_tax_level(l.stability, pressure);
            (level != l.tax_level).then_some(Action::SetTax { location: l.id, level })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_bands() {
        assert_eq!(choose_tax_level(10, true), TaxLevel::None);
        assert_eq!(choose_tax_level(40, false), TaxLevel::Low);
        assert_eq!(choose_tax_level(50, false), TaxLevel::Normal);
        assert_eq!(choose_tax_level(50, true), TaxLevel::High);
        assert_eq!(choose_tax_level(90, true), TaxLevel::VeryHigh);
    }
}
