//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use super::views::{HeaderView, ProductView};
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth};
use crate::state::AppState;

// =============================================================================
// Hero Configuration (Static content for carousel)
// =============================================================================

/// A single slide in the hero carousel.
#[derive(Clone)]
pub struct HeroSlide {
    pub title: &'static str,
    pub description: &'static str,
    pub image_url: &'static str,
    pub button_text: &'static str,
    pub button_url: &'static str,
}

/// Hero carousel configuration.
#[derive(Clone)]
pub struct HeroConfig {
    pub slides: Vec<HeroSlide>,
    pub autoplay_ms: u32,
}

impl Default for HeroConfig {
    fn default() -> Self {
        Self {
            slides: vec![
                HeroSlide {
                    title: "Discover the Latest Trends",
                    description: "Shop the newest arrivals in fashion, electronics, and more",
                    image_url: "https://images.unsplash.com/photo-1607082349566-187342175e2f?w=2000&q=80",
                    button_text: "Shop Now",
                    button_url: "/search",
                },
                HeroSlide {
                    title: "Premium Electronics",
                    description: "Explore cutting-edge technology at unbeatable prices",
                    image_url: "https://images.unsplash.com/photo-1441986300917-64674bd600d8?w=2000&q=80",
                    button_text: "Shop Now",
                    button_url: "/search?category=electronics",
                },
                HeroSlide {
                    title: "Home & Living Essentials",
                    description: "Transform your space with our curated collection",
                    image_url: "https://images.unsplash.com/photo-1555529669-e69e7aa0ba9a?w=2000&q=80",
                    button_text: "Shop Now",
                    button_url: "/search?category=home-living",
                },
            ],
            autoplay_ms: 5000,
        }
    }
}

// =============================================================================
// Featured Categories
// =============================================================================

/// A tile in the "Shop by Category" grid.
#[derive(Clone)]
pub struct CategoryTile {
    pub title: &'static str,
    pub image_url: &'static str,
    pub item_count: &'static str,
    /// Search category the tile links to.
    pub slug: &'static str,
}

const FEATURED_CATEGORIES: [CategoryTile; 4] = [
    CategoryTile {
        title: "Electronics & Gadgets",
        image_url: "https://images.unsplash.com/photo-1546868871-7041f2a55e12?w=400",
        item_count: "50,000+ items",
        slug: "electronics",
    },
    CategoryTile {
        title: "Fashion & Accessories",
        image_url: "https://images.unsplash.com/photo-1445205170230-053b83016050?w=400",
        item_count: "100,000+ items",
        slug: "fashion",
    },
    CategoryTile {
        title: "Home & Living",
        image_url: "https://images.unsplash.com/photo-1556911220-e15b29be8c8f?w=400",
        item_count: "35,000+ items",
        slug: "home-living",
    },
    CategoryTile {
        title: "Books & Stationery",
        image_url: "https://images.unsplash.com/photo-1495446815901-a7297e633e8d?w=400",
        item_count: "25,000+ items",
        slug: "books",
    },
];

/// Number of products in the "Trending Now" grid.
const TRENDING_LIMIT: usize = 4;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub header: HeaderView,
    pub nonce: String,
    /// Hero carousel configuration.
    pub hero: HeroConfig,
    pub categories: Vec<CategoryTile>,
    /// Newest products from the catalog.
    pub trending: Vec<ProductView>,
}

/// Display the home page.
#[instrument(skip_all)]
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    CspNonce(nonce): CspNonce,
) -> impl IntoResponse {
    let trending = state.catalog().trending(TRENDING_LIMIT).await.map_or_else(
        |e| {
            tracing::error!("Failed to fetch trending products: {e}");
            Vec::new()
        },
        |products| products.iter().map(ProductView::from).collect(),
    );

    HomeTemplate {
        header: HeaderView::load(&state, auth.as_ref()).await,
        nonce,
        hero: HeroConfig::default(),
        categories: FEATURED_CATEGORIES.to_vec(),
        trending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::views::SEARCH_CATEGORIES;

    #[test]
    fn test_hero_has_three_slides_with_autoplay() {
        let hero = HeroConfig::default();
        assert_eq!(hero.slides.len(), 3);
        assert_eq!(hero.autoplay_ms, 5000);
        assert!(hero.slides.iter().all(|s| s.button_text == "Shop Now"));
    }

    #[test]
    fn test_category_tiles_link_to_search_categories() {
        for tile in &FEATURED_CATEGORIES {
            assert!(
                SEARCH_CATEGORIES.iter().any(|(slug, _)| *slug == tile.slug),
                "{} links to an unknown category",
                tile.title
            );
        }
    }
}
