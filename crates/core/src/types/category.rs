//! Presentation icons for categories.

/// Icon shown on a category card, chosen from the category slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryIcon {
    Desktop,
    Bolt,
    Home,
    Shirt,
    Car,
    Toolbox,
    Cart,
}

impl CategoryIcon {
    /// Fixed slug lookup; unknown slugs fall back to [`CategoryIcon::Cart`].
    #[must_use]
    pub fn from_slug(slug: &str) -> Self {
        match slug {
            "eletronicos" => Self::Desktop,
            "esporte" => Self::Bolt,
            "casa" => Self::Home,
            "roupa" => Self::Shirt,
            "carros" => Self::Car,
            "acessorios" => Self::Toolbox,
            _ => Self::Cart,
        }
    }

    /// Glyph rendered inside the card.
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Desktop => "🖥️",
            Self::Bolt => "⚡",
            Self::Home => "🏠",
            Self::Shirt => "👕",
            Self::Car => "🚗",
            Self::Toolbox => "🧰",
            Self::Cart => "🛒",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_slugs() {
        assert_eq!(CategoryIcon::from_slug("eletronicos"), CategoryIcon::Desktop);
        assert_eq!(CategoryIcon::from_slug("esporte"), CategoryIcon::Bolt);
        assert_eq!(CategoryIcon::from_slug("casa"), CategoryIcon::Home);
        assert_eq!(CategoryIcon::from_slug("roupa"), CategoryIcon::Shirt);
        assert_eq!(CategoryIcon::from_slug("carros"), CategoryIcon::Car);
        assert_eq!(CategoryIcon::from_slug("acessorios"), CategoryIcon::Toolbox);
    }

    #[test]
    fn test_unknown_slug_falls_back_to_cart() {
        assert_eq!(CategoryIcon::from_slug("livros"), CategoryIcon::Cart);
        assert_eq!(CategoryIcon::from_slug(""), CategoryIcon::Cart);
    }
}
