//! Sample catalog for development databases.

use rusqlite::Connection;

use super::queries;
use crate::error::Result;
use crate::models::CreateReward;

const CATEGORIES: &[&str] = &[
    "Gift Cards",
    "Merchandise",
    "Discounts",
    "Experiences",
    "Digital Goods",
];

struct SampleReward {
    title: &'static str,
    description: &'static str,
    cost: i64,
    is_active: bool,
    category: Option<&'static str>,
}

const REWARDS: &[SampleReward] = &[
    SampleReward {
        title: "$10 Amazon Gift Card",
        description: "A digital gift card delivered to your email.",
        cost: 1000,
        is_active: true,
        category: Some("Gift Cards"),
    },
    SampleReward {
        title: "Company Logo T-Shirt",
        description: "Soft cotton tee with the HousrCash logo.",
        cost: 2500,
        is_active: true,
        category: Some("Merchandise"),
    },
    SampleReward {
        title: "Limited Edition Poster (Sold Out)",
        description: "Signed print from the launch event.",
        cost: 5000,
        is_active: false,
        category: Some("Merchandise"),
    },
    SampleReward {
        title: "15% Off Next Purchase",
        description: "One-time discount code for the partner store.",
        cost: 500,
        is_active: true,
        category: Some("Discounts"),
    },
    SampleReward {
        title: "Exclusive Wallpaper Pack",
        description: "Desktop and mobile wallpapers.",
        cost: 250,
        is_active: true,
        category: Some("Digital Goods"),
    },
    SampleReward {
        title: "One-Hour Expert Consultation",
        description: "A video call with a personal finance expert.",
        cost: 10000,
        is_active: true,
        category: Some("Experiences"),
    },
    SampleReward {
        title: "Logo Sticker Pack (Uncategorized)",
        description: "Five vinyl stickers.",
        cost: 300,
        is_active: true,
        category: None,
    },
];

/// Insert the sample categories and rewards.
///
/// Returns false without touching anything if the catalog already has rewards.
pub fn seed_catalog(conn: &Connection) -> Result<bool> {
    let existing: i64 = conn.query_row("SELECT COUNT(*) FROM rewards", [], |row| row.get(0))?;
    if existing > 0 {
        return Ok(false);
    }

    let mut category_ids = Vec::with_capacity(CATEGORIES.len());
    for name in CATEGORIES {
        let category = queries::upsert_category(conn, name)?;
        category_ids.push((category.name, category.id));
    }

    for sample in REWARDS {
        let category_id = sample.category.and_then(|wanted| {
            category_ids
                .iter()
                .find(|(name, _)| name == wanted)
                .map(|(_, id)| *id)
        });
        queries::create_reward(
            conn,
            &CreateReward {
                title: sample.title.to_string(),
                description: Some(sample.description.to_string()),
                cost: sample.cost,
                image_url: None,
                is_active: sample.is_active,
                category_id,
            },
        )?;
    }

    Ok(true)
}
