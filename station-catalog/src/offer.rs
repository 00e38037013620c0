use serde::{Deserialize, Serialize};
use station_core::CurrencyKind;

/// Offer categories that drive how a purchase is applied
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferCategory {
    /// Weapon or armor loadout, granted as a permanent entitlement
    Loadout,
    /// Class kit; also consumes the user's class selection token
    Kit,
    Challenge,
    /// Member of an offer line with a scheduled duration
    TimeLimited,
    Generic,
}

const LOADOUT_PREFIXES: [&str; 2] = ["weapon_loadout", "armor_loadout"];
const KIT_OFFERS: [&str; 3] = ["ranger_kit_offer", "sniper_kit_offer", "tactician_kit_offer"];
const CHALLENGE_PREFIX: &str = "challenge";

impl OfferCategory {
    pub fn classify(offer_id: &str, line_duration: i64) -> Self {
        if LOADOUT_PREFIXES.iter().any(|p| offer_id.starts_with(p)) {
            OfferCategory::Loadout
        } else if KIT_OFFERS.contains(&offer_id) {
            OfferCategory::Kit
        } else if offer_id.starts_with(CHALLENGE_PREFIX) {
            OfferCategory::Challenge
        } else if line_duration > 0 {
            OfferCategory::TimeLimited
        } else {
            OfferCategory::Generic
        }
    }

    /// Loadouts grant an entitlement flag, everything else a duration state.
    pub fn grants_entitlement(&self) -> bool {
        matches!(self, OfferCategory::Loadout)
    }
}

/// A purchasable catalog entry, resolved once at load time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OfferDefinition {
    pub offer_id: String,
    pub price: i64,
    pub currency: CurrencyKind,
    pub category: OfferCategory,
    /// Duration of the owning offer line in seconds, 0 when unscheduled
    pub duration: i64,
    /// User state the purchase grants
    pub state_name: String,
}

impl OfferDefinition {
    pub fn new(offer_id: impl Into<String>, price: i64, line_duration: i64) -> Self {
        let offer_id = offer_id.into();
        let currency = CurrencyKind::of_offer(&offer_id);
        let category = OfferCategory::classify(&offer_id, line_duration);
        let state_name = offer_id
            .strip_suffix(CurrencyKind::CREDITS_SUFFIX)
            .unwrap_or(&offer_id)
            .to_string();

        Self {
            offer_id,
            price,
            currency,
            category,
            duration: line_duration,
            state_name,
        }
    }
}
