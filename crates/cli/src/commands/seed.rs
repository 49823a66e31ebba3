//! Database seeding command.
//!
//! Seeds the default admin account, the billing-plan catalog, a demo
//! subscription with billing history, and a couple of sample
//! organizations. Idempotent: existing rows are left alone.

use chrono::{Duration, Utc};
use perche_core::PaymentStatus;
use perche_server::db::billing::{BillingRepository, NewBillingHistoryEntry, NewBillingPlan};
use perche_server::db::organizations::OrganizationRepository;
use perche_server::db::users::UserRepository;
use perche_server::models::User;
use perche_server::services::auth::hash_password;
use rust_decimal::Decimal;
use sqlx::SqlitePool;

use super::{CommandError, database_url};

/// Default admin credentials.
const ADMIN_USERNAME: &str = "admin";
const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "demo1234";

/// Seed the database with default data.
///
/// # Errors
///
/// Returns [`CommandError`] if the database is unreachable or an insert
/// fails.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = perche_server::db::create_pool(&database_url).await?;

    let admin = seed_admin_user(&pool).await?;
    seed_billing_plans(&pool).await?;
    seed_admin_subscription(&pool, &admin).await?;
    seed_organizations(&pool).await?;

    tracing::info!("Seed complete!");
    Ok(())
}

/// Create the default admin user if it doesn't exist.
async fn seed_admin_user(pool: &SqlitePool) -> Result<User, CommandError> {
    let users = UserRepository::new(pool);

    if let Some(user) = users.get_by_username(ADMIN_USERNAME).await? {
        tracing::info!("Admin user already exists");
        return Ok(user);
    }

    let email = perche_core::Email::parse(ADMIN_EMAIL)
        .map_err(perche_server::services::auth::AuthError::InvalidEmail)?;
    let user = users
        .create(ADMIN_USERNAME, &email, &hash_password(ADMIN_PASSWORD)?)
        .await?;

    tracing::info!(user_id = %user.id, "Admin user created");
    Ok(user)
}

/// Create the default billing plans that don't exist yet.
async fn seed_billing_plans(pool: &SqlitePool) -> Result<(), CommandError> {
    let billing = BillingRepository::new(pool);
    let existing = billing.list_plans(0, 100).await?;

    let default_plans = [
        NewBillingPlan {
            name: "Free".to_owned(),
            description: Some("Basic plan for individual users".to_owned()),
            price: Decimal::ZERO,
            features: vec![
                "Basic API access".to_owned(),
                "1GB storage".to_owned(),
                "1 team member".to_owned(),
            ],
            is_active: true,
        },
        NewBillingPlan {
            name: "Pro".to_owned(),
            description: Some("Professional plan for small teams".to_owned()),
            price: Decimal::new(2999, 2),
            features: vec![
                "Advanced API access".to_owned(),
                "10GB storage".to_owned(),
                "5 team members".to_owned(),
                "Priority support".to_owned(),
            ],
            is_active: true,
        },
        NewBillingPlan {
            name: "Enterprise".to_owned(),
            description: Some("Enterprise plan for large organizations".to_owned()),
            price: Decimal::new(9999, 2),
            features: vec![
                "Unlimited API access".to_owned(),
                "100GB storage".to_owned(),
                "Unlimited team members".to_owned(),
                "24/7 support".to_owned(),
                "Custom features".to_owned(),
            ],
            is_active: true,
        },
    ];

    for plan in default_plans {
        if existing.iter().any(|p| p.name == plan.name) {
            continue;
        }
        billing.create_plan(&plan).await?;
        tracing::info!(name = %plan.name, "Billing plan created");
    }

    Ok(())
}

/// Subscribe the admin to the Pro plan and backfill billing history.
async fn seed_admin_subscription(pool: &SqlitePool, admin: &User) -> Result<(), CommandError> {
    let billing = BillingRepository::new(pool);

    let Some(pro_plan) = billing
        .list_plans(0, 100)
        .await?
        .into_iter()
        .find(|p| p.name == "Pro")
    else {
        return Ok(());
    };

    if billing.active_subscription(admin.id).await?.is_none() {
        billing.subscribe(admin.id, pro_plan.id).await?;
        tracing::info!("Admin subscription created");
    }

    if billing.list_history(admin.id, 0, 1).await?.is_empty() {
        for months_ago in 1..=3 {
            billing
                .create_history(&NewBillingHistoryEntry {
                    user_id: admin.id,
                    plan_id: pro_plan.id,
                    amount: pro_plan.price,
                    status: PaymentStatus::Paid,
                    payment_date: Utc::now() - Duration::days(30 * months_ago),
                })
                .await?;
        }
        tracing::info!("Admin billing history created");
    }

    Ok(())
}

/// Create sample organizations for the admin listing.
async fn seed_organizations(pool: &SqlitePool) -> Result<(), CommandError> {
    let organizations = OrganizationRepository::new(pool);

    if !organizations.list(0, 1).await?.is_empty() {
        return Ok(());
    }

    organizations
        .create("Acme Commerce", Some("Demo storefront operator"))
        .await?;
    organizations
        .create("Globex Retail", Some("Demo enterprise account"))
        .await?;
    tracing::info!("Sample organizations created");

    Ok(())
}
