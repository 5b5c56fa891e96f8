//! Demo data seeding
//!
//! Users are created in a single transaction so a half-seeded user table
//! is never left behind; posts, comments and follower edges follow as
//! independent writes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::context::QueryContext;
use crate::error::{Result, StoreError};
use crate::models::{Comment, Password, Post, User};
use crate::storage::Storage;
use crate::tx::with_transaction;

const USERNAMES: &[&str] = &[
    "tech_guru",
    "foodie_diaries",
    "wanderlust_jane",
    "fit_and_fab",
    "bookworm_emily",
    "artsy_andy",
    "game_master",
    "travel_tales",
    "eco_warrior",
    "fashionista_kate",
    "music_lover",
    "movie_buff",
    "science_geek",
    "coding_ninja",
    "pet_lover",
    "yoga_enthusiast",
    "finance_wizard",
    "history_buff",
    "meme_king",
    "fitness_freak",
    "nature_photographer",
    "sports_fanatic",
    "minimalist_mary",
    "urban_farmer",
    "tech_trends",
    "startuplife",
    "influencer_dave",
    "design_thinker",
    "social_sam",
    "creative_coder",
    "adventure_alex",
    "skincare_expert",
    "home_chef",
    "news_junkie",
    "crypto_crusher",
    "content_creator",
    "digital_nomad",
    "community_builder",
    "artist_june",
];

const TITLES: &[&str] = &[
    "How to Start Your Day Right",
    "Top 10 Travel Destinations",
    "Mastering the Art of Minimalism",
    "The Beginner's Guide to Investing",
    "Healthy Recipes for Busy Professionals",
    "10 Must-Read Books This Year",
    "Travel on a Budget: Tips and Tricks",
    "The Future of AI in Daily Life",
    "Fitness Hacks You Need to Know",
    "Sustainable Living: A Practical Guide",
    "Best Photography Tips for Beginners",
    "The Evolution of Social Media",
    "Gaming Trends to Watch",
    "The Art of Meditation",
    "Building a Successful Startup",
    "The Ultimate Skincare Routine",
    "How to Stay Productive While Working Remotely",
    "The Magic of Daily Journaling",
    "Exploring Local Food Culture",
    "How to Create Stunning Visual Art",
];

const CONTENTS: &[&str] = &[
    "Start your mornings with these simple habits to boost your energy and productivity.",
    "Explore these incredible travel destinations that you must visit this year!",
    "Learn how to simplify your life and focus on what truly matters.",
    "Discover how to start investing, even with a small budget, and grow your wealth.",
    "Quick and healthy meal ideas for busy professionals on the go.",
    "Expand your horizons with these fascinating books.",
    "Find out how to travel the world without breaking the bank.",
    "How artificial intelligence is changing the way we live and work.",
    "Simple exercises and tips to stay fit and healthy in a busy world.",
    "Practical steps to reduce waste and live a sustainable lifestyle.",
    "Capture breathtaking moments with these beginner-friendly photography tips.",
    "A look at the journey of social media and what lies ahead.",
    "What's next in the gaming world? Here are the trends to watch.",
    "Calm your mind and improve focus with these meditation practices.",
    "Step-by-step guide to turning your startup idea into reality.",
    "Achieve glowing skin with these easy-to-follow skincare tips.",
    "Stay productive and focused while working remotely with these strategies.",
    "Why keeping a journal can transform your mindset and creativity.",
    "Experience the flavors and traditions of local food cultures.",
    "Unleash your creativity with these techniques for making stunning art.",
];

const TAGS: &[&str] = &[
    "lifestyle",
    "health",
    "fitness",
    "travel",
    "photography",
    "technology",
    "books",
    "finance",
    "sustainability",
    "art",
    "minimalism",
    "meditation",
    "gaming",
    "startups",
    "skincare",
    "recipes",
    "inspiration",
    "productivity",
    "socialmedia",
    "culture",
];

const COMMENTS: &[&str] = &[
    "Great tips! Thanks for sharing.",
    "I totally agree with this.",
    "Can't wait to try this out!",
    "This was really helpful, thanks!",
    "Such an inspiring post!",
    "Do you have more content like this?",
    "Loved this! Keep it up.",
    "Very informative, thank you.",
    "Bookmarking this for later.",
    "This is exactly what I needed to hear today.",
    "Great writing as always.",
    "Thanks for breaking it down so well.",
    "Super useful tips, thanks!",
    "This post really resonated with me.",
    "I learned so much from this!",
    "Do you have any other recommendations?",
    "Amazing content, as usual.",
    "This gave me a new perspective.",
];

/// How much to seed.
#[derive(Debug, Clone)]
pub struct SeedPlan {
    pub users: usize,
    pub posts: usize,
    pub comments: usize,
    pub follows: usize,
    /// Fixed seed for reproducible data; `None` draws from the OS.
    pub rng_seed: Option<u64>,
    /// Shared password for every seeded user; hashed once.
    pub password: Option<String>,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            users: 100,
            posts: 200,
            comments: 500,
            follows: 0,
            rng_seed: None,
            password: None,
        }
    }
}

impl SeedPlan {
    fn rng(&self) -> StdRng {
        match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub users: usize,
    pub posts: usize,
    pub comments: usize,
    pub follows: usize,
}

/// Seed `storage` according to `plan`. Stops at the first failed write.
pub async fn seed(storage: &Storage, ctx: &QueryContext, plan: SeedPlan) -> Result<SeedReport> {
    let mut rng = plan.rng();
    let mut report = SeedReport::default();

    let password = plan.password.as_deref().map(Password::hashed).transpose()?;
    let users = generate_users(plan.users, password.as_ref());

    let repo = storage.users.clone();
    let tx_ctx = ctx.clone();
    let users = with_transaction(storage.transactions.as_ref(), ctx, move |tx| {
        Box::pin(async move {
            let mut users = users;
            for user in users.iter_mut() {
                repo.create(&tx_ctx, tx, user).await?;
            }
            Ok::<_, StoreError>(users)
        })
    })
    .await?;
    report.users = users.len();
    tracing::info!(count = report.users, "seeded users");

    // Posts and comments need authors
    if users.is_empty() {
        return Ok(report);
    }

    let mut posts = generate_posts(&mut rng, plan.posts, &users);
    for post in posts.iter_mut() {
        storage.posts.create(ctx, post).await?;
    }
    report.posts = posts.len();
    tracing::info!(count = report.posts, "seeded posts");

    if !posts.is_empty() {
        let mut comments = generate_comments(&mut rng, plan.comments, &users, &posts);
        for comment in comments.iter_mut() {
            storage.comments.create(ctx, comment).await?;
        }
        report.comments = comments.len();
        tracing::info!(count = report.comments, "seeded comments");
    }

    let user_ids: Vec<i64> = users.iter().map(|u| u.id).collect();
    report.follows = follow_random(storage, ctx, &mut rng, &user_ids, plan.follows).await?;

    tracing::info!(?report, "seeded successfully");
    Ok(report)
}

/// Add up to `count` random follower edges between `user_ids`.
///
/// Drawing an edge that already exists is skipped, so the result can be
/// lower than `count`. Returns the number of edges created.
pub async fn follow_random<R: Rng + Send>(
    storage: &Storage,
    ctx: &QueryContext,
    rng: &mut R,
    user_ids: &[i64],
    count: usize,
) -> Result<usize> {
    if user_ids.len() < 2 {
        return Ok(0);
    }

    let mut created = 0;
    for _ in 0..count {
        let follower = user_ids[rng.gen_range(0..user_ids.len())];
        let followed = user_ids[rng.gen_range(0..user_ids.len())];
        if follower == followed {
            continue;
        }
        match storage.followers.follow(ctx, follower, followed).await {
            Ok(()) => created += 1,
            Err(err) if err.is_conflict() => {}
            Err(err) => return Err(err),
        }
    }
    Ok(created)
}

fn pick<R: Rng>(rng: &mut R, items: &[&'static str]) -> &'static str {
    items[rng.gen_range(0..items.len())]
}

fn generate_users(count: usize, password: Option<&Password>) -> Vec<User> {
    (0..count)
        .map(|i| {
            let username = format!("{}{i}", USERNAMES[i % USERNAMES.len()]);
            let mut user = User::new(&username, format!("{username}@example.com"));
            user.is_active = true;
            if let Some(password) = password {
                user.password = password.clone();
            }
            user
        })
        .collect()
}

fn generate_posts<R: Rng>(rng: &mut R, count: usize, users: &[User]) -> Vec<Post> {
    (0..count)
        .map(|_| {
            let author = &users[rng.gen_range(0..users.len())];
            Post::new(
                author.id,
                pick(rng, TITLES),
                pick(rng, CONTENTS),
                vec![pick(rng, TAGS).to_string(), pick(rng, TAGS).to_string()],
            )
        })
        .collect()
}

fn generate_comments<R: Rng>(
    rng: &mut R,
    count: usize,
    users: &[User],
    posts: &[Post],
) -> Vec<Comment> {
    (0..count)
        .map(|_| {
            let author = &users[rng.gen_range(0..users.len())];
            let post = &posts[rng.gen_range(0..posts.len())];
            Comment::new(post.id, author.id, pick(rng, COMMENTS))
        })
        .collect()
}
