//! Keyword-based product category inference.
//!
//! The catalog and the admin panel historically classify products with
//! different keyword rules and in a different priority order. Both orders are
//! kept as named [`CategoryPriority`] variants so each view stays stable; a
//! product can land in different categories depending on the variant.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use super::product::Product;

/// Closed set of product categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Cpu,
    Gpu,
    Memory,
    Storage,
    Motherboard,
    Psu,
    Cooling,
    Other,
}

/// Keyword rule set and precedence used by a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CategoryPriority {
    /// Catalog and product detail pages: gpu and motherboard first, cpu last.
    /// Matches on the name and the joined specification values.
    #[default]
    Catalog,
    /// Admin panel: cpu and brand keywords first. Matches on the name and on
    /// the presence of well-known specification keys.
    Admin,
}

impl Category {
    /// All categories in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Cpu,
        Self::Gpu,
        Self::Memory,
        Self::Storage,
        Self::Motherboard,
        Self::Psu,
        Self::Cooling,
        Self::Other,
    ];

    /// Infer the category of a product under the given rule set.
    #[must_use]
    pub fn infer(product: &Product, priority: CategoryPriority) -> Self {
        match priority {
            CategoryPriority::Catalog => infer_catalog(product),
            CategoryPriority::Admin => infer_admin(product),
        }
    }

    /// Machine name, as used in filters and the `category` field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Gpu => "gpu",
            Self::Memory => "memory",
            Self::Storage => "storage",
            Self::Motherboard => "motherboard",
            Self::Psu => "psu",
            Self::Cooling => "cooling",
            Self::Other => "other",
        }
    }

    /// Label shown in the catalog breadcrumb and product detail page.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Cpu => "Processor",
            Self::Gpu => "Grafische Kaart",
            Self::Memory => "Geheugen",
            Self::Storage => "Opslag",
            Self::Motherboard => "Moederbord",
            Self::Psu => "Voeding",
            Self::Cooling => "Koeling",
            Self::Other => "Overig",
        }
    }

    /// Label shown in the admin product list.
    #[must_use]
    pub const fn admin_label(self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            Self::Gpu => "GPU",
            Self::Memory => "Geheugen",
            Self::Storage => "Opslag",
            Self::Motherboard => "Moederbord",
            Self::Psu => "Voeding",
            Self::Cooling => "Koeling",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown category name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

fn infer_catalog(product: &Product) -> Category {
    let name = product.name.to_lowercase();
    let specs = product
        .specifications
        .values()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let any = |haystack: &str, needles: &[&str]| needles.iter().any(|n| haystack.contains(n));

    if any(&name, &["gpu", "graphics"]) || any(&specs, &["gpu", "graphics"]) {
        Category::Gpu
    } else if name.contains("motherboard") || any(&specs, &["motherboard", "wifi"]) {
        Category::Motherboard
    } else if any(&name, &["memory", "ram"]) || specs.contains("ddr") {
        Category::Memory
    } else if any(&name, &["ssd", "hdd", "storage"]) || specs.contains("storage") {
        Category::Storage
    } else if any(&name, &["cooler", "cooling"]) || specs.contains("cooling") {
        Category::Cooling
    } else if any(&name, &["psu", "power"]) || specs.contains("power") {
        Category::Psu
    } else if any(&name, &["cpu", "processor"]) || specs.contains("processor") {
        Category::Cpu
    } else {
        Category::Other
    }
}

fn infer_admin(product: &Product) -> Category {
    let name = product.name.to_lowercase();
    let specs = &product.specifications;
    let any = |needles: &[&str]| needles.iter().any(|n| name.contains(n));
    let has = |key: &str| specs.get(key).is_some_and(|v| !v.is_empty());

    if any(&["cpu", "intel", "amd"]) || has("socket") {
        Category::Cpu
    } else if any(&["gpu", "graphics", "rtx", "gtx"]) {
        Category::Gpu
    } else if any(&["memory", "ddr", "ram"]) || has("memory_type") {
        Category::Memory
    } else if any(&["ssd", "hdd", "storage"]) || has("capacity") {
        Category::Storage
    } else if any(&["motherboard", "board"]) || has("chipset") {
        Category::Motherboard
    } else if any(&["psu", "power", "watt"]) || has("wattage") {
        Category::Psu
    } else if any(&["cooler", "cooling", "fan"])
        || specs.get("type").is_some_and(|t| t == "Air Cooler")
    {
        Category::Cooling
    } else {
        Category::Other
    }
}
