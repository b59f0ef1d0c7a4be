use once_cell::sync::Lazy;
use storefront::{
    catalog::InMemoryCatalog,
    model::{FulfillmentType, Money, Platform, Service, ServiceCategory, ServiceVariant},
};

static SERVICES: Lazy<Vec<Service>> = Lazy::new(|| {
    vec![
        service(
            "instagram-followers",
            "Instagram Followers",
            "Grow your profile with followers from active accounts",
            ServiceCategory::Followers,
            Platform::Instagram,
            499,
            "1-3 days",
            &["Real looking profiles", "Drip-fed delivery", "30 day refill"],
            true,
            vec![
                variant("ig-followers-100", "100 Followers", FulfillmentType::Real, 499, 100, false),
                variant("ig-followers-500", "500 Followers", FulfillmentType::Real, 1999, 500, true),
                variant("ig-followers-1000", "1000 Followers", FulfillmentType::Progressive, 3499, 1000, false),
                variant("ig-followers-5000", "5000 Followers", FulfillmentType::Progressive, 14999, 5000, false),
            ],
        ),
        service(
            "instagram-likes",
            "Instagram Likes",
            "Likes delivered to a single post",
            ServiceCategory::Likes,
            Platform::Instagram,
            299,
            "Within 1 hour",
            &["Instant start", "No password needed"],
            true,
            vec![
                variant("ig-likes-100", "100 Likes", FulfillmentType::Instant, 299, 100, false),
                variant("ig-likes-500", "500 Likes", FulfillmentType::Instant, 999, 500, true),
                variant("ig-likes-1000", "1000 Likes", FulfillmentType::Automated, 1799, 1000, false),
            ],
        ),
        service(
            "instagram-views",
            "Instagram Reel Views",
            "Views on reels and videos",
            ServiceCategory::Views,
            Platform::Instagram,
            199,
            "Within 2 hours",
            &["Counts towards reel reach"],
            false,
            vec![
                variant("ig-views-1000", "1000 Views", FulfillmentType::Automated, 199, 1000, false),
                variant("ig-views-10000", "10000 Views", FulfillmentType::Automated, 1499, 10000, false),
            ],
        ),
        service(
            "instagram-comments",
            "Instagram Comments",
            "Custom or random comments on a post",
            ServiceCategory::Comments,
            Platform::Instagram,
            899,
            "12-24 hours",
            &["Relevant wording", "Spread over a day"],
            false,
            vec![
                variant("ig-comments-random-10", "10 Random Comments", FulfillmentType::Random, 899, 10, false),
                variant("ig-comments-targeted-10", "10 Targeted Comments", FulfillmentType::Targeted, 1499, 10, false),
            ],
        ),
        service(
            "tiktok-followers",
            "TikTok Followers",
            "Followers for your TikTok account",
            ServiceCategory::Followers,
            Platform::Tiktok,
            599,
            "1-2 days",
            &["Gradual delivery", "30 day refill"],
            true,
            vec![
                variant("tt-followers-100", "100 Followers", FulfillmentType::Real, 599, 100, false),
                variant("tt-followers-1000", "1000 Followers", FulfillmentType::Progressive, 3999, 1000, true),
            ],
        ),
        service(
            "tiktok-likes",
            "TikTok Likes",
            "Likes on one TikTok video",
            ServiceCategory::Likes,
            Platform::Tiktok,
            349,
            "Within 1 hour",
            &["Instant start"],
            false,
            vec![
                variant("tt-likes-250", "250 Likes", FulfillmentType::Instant, 349, 250, false),
                variant("tt-likes-1000", "1000 Likes", FulfillmentType::Instant, 1199, 1000, false),
            ],
        ),
        service(
            "tiktok-views",
            "TikTok Views",
            "Video views to push content into the feed",
            ServiceCategory::Views,
            Platform::Tiktok,
            149,
            "Within 30 minutes",
            &["High retention"],
            false,
            vec![
                variant("tt-views-5000", "5000 Views", FulfillmentType::Automated, 149, 5000, false),
                variant("tt-views-50000", "50000 Views", FulfillmentType::Automated, 999, 50000, true),
            ],
        ),
        service(
            "tiktok-shares",
            "TikTok Shares",
            "Shares that spread a video beyond your followers",
            ServiceCategory::Shares,
            Platform::Tiktok,
            449,
            "6-12 hours",
            &[],
            false,
            vec![],
        ),
        service(
            "youtube-subscribers",
            "YouTube Subscribers",
            "Subscribers for your channel",
            ServiceCategory::Subscribers,
            Platform::Youtube,
            1299,
            "3-7 days",
            &["Slow natural pace", "60 day refill"],
            true,
            vec![
                variant("yt-subs-100", "100 Subscribers", FulfillmentType::Progressive, 1299, 100, false),
                variant("yt-subs-500", "500 Subscribers", FulfillmentType::Progressive, 5499, 500, true),
            ],
        ),
        service(
            "youtube-views",
            "YouTube Views",
            "Views on a YouTube video",
            ServiceCategory::Views,
            Platform::Youtube,
            399,
            "1-2 days",
            &["Monetization safe"],
            false,
            vec![
                variant("yt-views-1000", "1000 Views", FulfillmentType::Real, 399, 1000, false),
                variant("yt-views-10000", "10000 Views", FulfillmentType::Real, 2999, 10000, false),
            ],
        ),
        service(
            "youtube-likes",
            "YouTube Likes",
            "Likes on a YouTube video",
            ServiceCategory::Likes,
            Platform::Youtube,
            349,
            "12-24 hours",
            &[],
            false,
            vec![],
        ),
        service(
            "facebook-page-likes",
            "Facebook Page Likes",
            "Likes for a Facebook page",
            ServiceCategory::Likes,
            Platform::Facebook,
            699,
            "2-4 days",
            &["Targeted by country on request"],
            false,
            vec![
                variant("fb-likes-250", "250 Page Likes", FulfillmentType::Targeted, 699, 250, false),
                variant("fb-likes-1000", "1000 Page Likes", FulfillmentType::Targeted, 2299, 1000, false),
            ],
        ),
        service(
            "facebook-followers",
            "Facebook Followers",
            "Followers for profiles and pages",
            ServiceCategory::Followers,
            Platform::Facebook,
            799,
            "2-4 days",
            &[],
            false,
            vec![],
        ),
        service(
            "twitter-followers",
            "X (Twitter) Followers",
            "Followers for your X account",
            ServiceCategory::Followers,
            Platform::Twitter,
            699,
            "1-3 days",
            &["Drip-fed delivery"],
            false,
            vec![
                variant("tw-followers-250", "250 Followers", FulfillmentType::Real, 699, 250, false),
                variant("tw-followers-1000", "1000 Followers", FulfillmentType::Progressive, 2499, 1000, false),
            ],
        ),
        service(
            "spotify-plays",
            "Spotify Plays",
            "Plays on a track from real listeners",
            ServiceCategory::Views,
            Platform::Spotify,
            499,
            "2-5 days",
            &["Counts towards royalties"],
            false,
            vec![
                variant("sp-plays-1000", "1000 Plays", FulfillmentType::Real, 499, 1000, false),
                variant("sp-plays-10000", "10000 Plays", FulfillmentType::Real, 3999, 10000, true),
            ],
        ),
        service(
            "spotify-followers",
            "Spotify Followers",
            "Followers for an artist profile or playlist",
            ServiceCategory::Followers,
            Platform::Spotify,
            599,
            "2-5 days",
            &[],
            false,
            vec![],
        ),
    ]
});

#[allow(clippy::too_many_arguments)]
fn service(
    id: &str,
    title: &str,
    description: &str,
    category: ServiceCategory,
    platform: Platform,
    price_cents: i64,
    delivery_time: &str,
    features: &[&str],
    popular: bool,
    variants: Vec<ServiceVariant>,
) -> Service {
    Service {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        category,
        platform,
        price: Money::from_cents(price_cents),
        delivery_time: delivery_time.to_string(),
        features: features.iter().map(|f| f.to_string()).collect(),
        popular,
        variants,
    }
}

fn variant(
    id: &str,
    title: &str,
    fulfillment: FulfillmentType,
    price_cents: i64,
    quantity: u32,
    popular: bool,
) -> ServiceVariant {
    ServiceVariant {
        id: id.to_string(),
        description: format!("{} with {} delivery", title, fulfillment),
        title: title.to_string(),
        fulfillment,
        price: Money::from_cents(price_cents),
        quantity,
        popular,
    }
}

/// The shop's service list.
pub fn services() -> &'static [Service] {
    &SERVICES
}

pub fn default_catalog() -> InMemoryCatalog {
    InMemoryCatalog::new(SERVICES.clone())
}
