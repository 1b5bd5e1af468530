use serde::{Deserialize, Serialize};

use crate::utils::contains_ignore_case;

/// Marker in a facility name that designates a national referral center.
const NATIONAL_MARKER: &str = "RSUP";

/// Shown when a facility has no usable phone number.
pub const NO_PHONE_PLACEHOLDER: &str = "No phone available";

/// A healthcare facility as returned by the facility endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
    pub name: String,
    pub address: String,
    pub region: String,
    pub province: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Facility {
    /// Whether this is a national referral center (RSUP).
    pub fn is_referral_center(&self) -> bool {
        contains_ignore_case(&self.name, NATIONAL_MARKER)
    }

    pub fn display_phone(&self) -> &str {
        self.phone
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(NO_PHONE_PLACEHOLDER)
    }

    /// Classify the facility for picking illustrative imagery.
    /// Name keywords take precedence over province keywords.
    pub fn thumbnail_key(&self) -> ThumbnailKey {
        if contains_ignore_case(&self.name, NATIONAL_MARKER) {
            ThumbnailKey::National
        } else if contains_ignore_case(&self.name, "UMUM") {
            ThumbnailKey::General
        } else if contains_ignore_case(&self.name, "PARU") {
            ThumbnailKey::Pulmonary
        } else if contains_ignore_case(&self.province, "Jakarta") {
            ThumbnailKey::Jakarta
        } else if contains_ignore_case(&self.province, "Jawa") {
            ThumbnailKey::Java
        } else if contains_ignore_case(&self.province, "Bali") {
            ThumbnailKey::Bali
        } else {
            ThumbnailKey::Default
        }
    }

    /// Case-insensitive substring match over name, address, province and region.
    pub fn matches(&self, query: &str) -> bool {
        contains_ignore_case(&self.name, query)
            || contains_ignore_case(&self.address, query)
            || contains_ignore_case(&self.province, query)
            || contains_ignore_case(&self.region, query)
    }

    pub fn in_province(&self, province: &str) -> bool {
        self.province.to_lowercase() == province.to_lowercase()
    }
}

/// Imagery category derived from a facility's name and province.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThumbnailKey {
    National,
    General,
    Pulmonary,
    Jakarta,
    Java,
    Bali,
    Default,
}

impl ThumbnailKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThumbnailKey::National => "national",
            ThumbnailKey::General => "general",
            ThumbnailKey::Pulmonary => "pulmonary",
            ThumbnailKey::Jakarta => "jakarta",
            ThumbnailKey::Java => "java",
            ThumbnailKey::Bali => "bali",
            ThumbnailKey::Default => "default",
        }
    }

    pub fn image_url(&self) -> &'static str {
        match self {
            ThumbnailKey::National => {
                "https://images.unsplash.com/photo-1587351021759-3e566b6af7cc?w=400&h=300&fit=crop"
            }
            ThumbnailKey::General => {
                "https://images.unsplash.com/photo-1519494026892-80bbd2d6fd0d?w=400&h=300&fit=crop"
            }
            ThumbnailKey::Pulmonary => {
                "https://images.unsplash.com/photo-1576091160399-112ba8d25d1f?w=400&h=300&fit=crop"
            }
            ThumbnailKey::Jakarta => {
                "https://images.unsplash.com/photo-1571019613454-1cb2f99b2d8b?w=400&h=300&fit=crop"
            }
            ThumbnailKey::Java => {
                "https://images.unsplash.com/photo-1582750433449-648ed127bb54?w=400&h=300&fit=crop"
            }
            ThumbnailKey::Bali => {
                "https://images.unsplash.com/photo-1578662996442-48f60103fc96?w=400&h=300&fit=crop"
            }
            ThumbnailKey::Default => {
                "https://images.unsplash.com/photo-1538108149393-fbbd81895907?w=400&h=300&fit=crop"
            }
        }
    }
}
