//! Fixed conversion-factor table for construction units.
//!
//! Factors are keyed `"{from}_to_{to}"` and grouped by category. Lookup walks
//! the categories in order and the first one holding the key wins.

/// Unit category with its conversion pairs.
struct Category {
    name: &'static str,
    factors: &'static [(&'static str, f64)],
}

const LENGTH: Category = Category {
    name: "length",
    factors: &[
        ("ft_to_m", 0.3048),
        ("m_to_ft", 3.280_84),
        ("in_to_cm", 2.54),
        ("cm_to_in", 0.393_701),
        ("in_to_mm", 25.4),
        ("mm_to_in", 0.039_370_1),
        ("ft_to_in", 12.0),
        ("in_to_ft", 1.0 / 12.0),
        ("yd_to_ft", 3.0),
        ("ft_to_yd", 1.0 / 3.0),
        ("yd_to_m", 0.9144),
        ("m_to_yd", 1.093_61),
        ("mi_to_km", 1.609_344),
        ("km_to_mi", 0.621_371),
        ("mi_to_ft", 5280.0),
        ("ft_to_mi", 1.0 / 5280.0),
        ("m_to_cm", 100.0),
        ("cm_to_m", 0.01),
        ("m_to_mm", 1000.0),
        ("mm_to_m", 0.001),
        ("km_to_m", 1000.0),
        ("m_to_km", 0.001),
    ],
};

const AREA: Category = Category {
    name: "area",
    factors: &[
        ("sqft_to_sqm", 0.092_903),
        ("sqm_to_sqft", 10.7639),
        ("sqyd_to_sqft", 9.0),
        ("sqft_to_sqyd", 1.0 / 9.0),
        ("sqyd_to_sqm", 0.836_127),
        ("sqm_to_sqyd", 1.195_99),
        ("acre_to_sqft", 43_560.0),
        ("sqft_to_acre", 1.0 / 43_560.0),
        ("acre_to_ha", 0.404_686),
        ("ha_to_acre", 2.471_05),
        ("ha_to_sqm", 10_000.0),
        ("sqm_to_ha", 0.0001),
    ],
};

const VOLUME: Category = Category {
    name: "volume",
    factors: &[
        ("cuft_to_cuyd", 1.0 / 27.0),
        ("cuyd_to_cuft", 27.0),
        ("cuyd_to_cum", 0.764_555),
        ("cum_to_cuyd", 1.307_95),
        ("cuft_to_cum", 0.028_316_8),
        ("cum_to_cuft", 35.3147),
        ("gal_to_l", 3.785_41),
        ("l_to_gal", 0.264_172),
        ("cuft_to_gal", 7.480_52),
        ("gal_to_cuft", 0.133_681),
        ("cum_to_l", 1000.0),
        ("l_to_cum", 0.001),
    ],
};

const WEIGHT: Category = Category {
    name: "weight",
    factors: &[
        ("lb_to_kg", 0.453_592),
        ("kg_to_lb", 2.204_62),
        ("ton_to_lb", 2000.0),
        ("lb_to_ton", 0.0005),
        ("ton_to_kg", 907.185),
        ("kg_to_ton", 0.001_102_31),
        ("tonne_to_kg", 1000.0),
        ("kg_to_tonne", 0.001),
        ("ton_to_tonne", 0.907_185),
        ("tonne_to_ton", 1.102_31),
        ("oz_to_g", 28.3495),
        ("g_to_oz", 0.035_274),
    ],
};

const CATEGORIES: [Category; 4] = [LENGTH, AREA, VOLUME, WEIGHT];

/// A resolved conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    pub factor: f64,
    pub category: &'static str,
}

/// Map spelled-out or symbolic unit names onto the table's short names.
///
/// Unknown names are returned lower-cased so the lookup reports them as given.
pub fn normalize_unit(unit: &str) -> String {
    let unit = unit.trim().to_lowercase();
    let short = match unit.as_str() {
        "foot" | "feet" | "'" => "ft",
        "meter" | "meters" | "metre" | "metres" => "m",
        "inch" | "inches" | "\"" => "in",
        "centimeter" | "centimeters" | "centimetre" | "centimetres" => "cm",
        "millimeter" | "millimeters" | "millimetre" | "millimetres" => "mm",
        "yard" | "yards" => "yd",
        "mile" | "miles" => "mi",
        "kilometer" | "kilometers" | "kilometre" | "kilometres" => "km",
        "sf" | "ft2" | "sq ft" | "square foot" | "square feet" => "sqft",
        "m2" | "sq m" | "square meter" | "square meters" | "square metre" | "square metres" => {
            "sqm"
        }
        "sy" | "yd2" | "sq yd" | "square yard" | "square yards" => "sqyd",
        "acres" => "acre",
        "hectare" | "hectares" => "ha",
        "cf" | "ft3" | "cu ft" | "cubic foot" | "cubic feet" => "cuft",
        "cy" | "yd3" | "cu yd" | "cubic yard" | "cubic yards" => "cuyd",
        "m3" | "cu m" | "cubic meter" | "cubic meters" | "cubic metre" | "cubic metres" => "cum",
        "gallon" | "gallons" => "gal",
        "liter" | "liters" | "litre" | "litres" => "l",
        "lbs" | "pound" | "pounds" => "lb",
        "kilogram" | "kilograms" => "kg",
        "tons" | "short ton" | "short tons" => "ton",
        "tonnes" | "metric ton" | "metric tons" | "t" => "tonne",
        "ounce" | "ounces" => "oz",
        "gram" | "grams" => "g",
        _ => return unit,
    };
    short.to_string()
}

/// Find the factor converting `from` into `to`.
///
/// Converting a unit into itself is the identity.
pub fn lookup(from: &str, to: &str) -> Option<Conversion> {
    let from = normalize_unit(from);
    let to = normalize_unit(to);
    let key = format!("{}_to_{}", from, to);

    let found = CATEGORIES.iter().find_map(|category| {
        category
            .factors
            .iter()
            .find(|(pair, _)| *pair == key)
            .map(|(_, factor)| Conversion {
                factor: *factor,
                category: category.name,
            })
    });

    found.or_else(|| {
        if from != to {
            return None;
        }
        CATEGORIES
            .iter()
            .find(|category| {
                category
                    .factors
                    .iter()
                    .any(|(pair, _)| pair.starts_with(&format!("{}_to_", from)))
            })
            .map(|category| Conversion {
                factor: 1.0,
                category: category.name,
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feet_to_meters() {
        let conversion = lookup("ft", "m").unwrap();
        assert_eq!(conversion.category, "length");
        assert!((conversion.factor - 0.3048).abs() < 1e-12);
    }

    #[test]
    fn test_aliases_and_case() {
        assert_eq!(lookup("Feet", "METERS"), lookup("ft", "m"));
        assert_eq!(lookup("cubic feet", "CY").unwrap().category, "volume");
        assert_eq!(lookup("lbs", "kg").unwrap().category, "weight");
    }

    #[test]
    fn test_identity_for_known_unit() {
        let conversion = lookup("sqft", "square feet").unwrap();
        assert_eq!(conversion.factor, 1.0);
        assert_eq!(conversion.category, "area");
        assert!(lookup("furlong", "furlong").is_none());
    }

    #[test]
    fn test_cross_category_is_unsupported() {
        assert!(lookup("ft", "kg").is_none());
        assert!(lookup("sqft", "cuyd").is_none());
    }

    #[test]
    fn test_factors_invert() {
        for category in CATEGORIES.iter() {
            for (pair, factor) in category.factors {
                let (from, to) = pair.split_once("_to_").unwrap();
                if let Some(inverse) = lookup(to, from) {
                    let product = factor * inverse.factor;
                    assert!((product - 1.0).abs() < 1e-4, "{} round trip {}", pair, product);
                }
            }
        }
    }
}
