use pharmabroker::{
    config::{app, database},
    core::{
        client, deal,
        fallback::{self, TrackedList},
        fixtures::FixtureSet,
        normalize, product, ranking, requirement, supplier, synthesis,
    },
    errors::Result,
    models::{Client, Deal, Product, Requirement, RequirementStatus, Supplier},
};
use dotenvy::dotenv;
use sea_orm::DatabaseConnection;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load the application configuration and fixture data
    let app_config = app::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    info!(role = ?app_config.role, "Configuration loaded");

    let fixtures = match &app_config.fixtures_path {
        Some(path) => FixtureSet::load(path),
        None => FixtureSet::bundled(),
    }
    .inspect_err(|e| error!("Failed to load fixture data: {}", e))?;

    // 4. Connect; an unreachable database still leaves the fixture lists usable
    let db = connect().await;

    // 5. Load every list through the fallback policy
    let clients: TrackedList<Client> = fallback::load(
        "clients",
        client::fetch_client_rows(&db),
        &fixtures.clients,
        normalize::normalize_clients,
    )
    .await
    .into();
    let requirements: TrackedList<Requirement> = fallback::load(
        "client_requirements",
        requirement::fetch_requirement_rows(&db),
        &fixtures.requirements,
        normalize::normalize_requirements,
    )
    .await
    .into();
    let suppliers: TrackedList<Supplier> = fallback::load(
        "suppliers",
        supplier::fetch_supplier_rows(&db),
        &fixtures.suppliers,
        normalize::normalize_suppliers,
    )
    .await
    .into();
    let products: TrackedList<Product> = fallback::load(
        "supplier_products",
        product::fetch_product_rows(&db),
        &fixtures.products,
        normalize::normalize_products,
    )
    .await
    .into();
    let deals: TrackedList<Deal> = fallback::load(
        "deals",
        deal::fetch_deal_rows(&db),
        &fixtures.deals,
        normalize::normalize_deals,
    )
    .await
    .into();

    // 6. Report the best match for every open requirement
    let clients = clients.entities();
    let suppliers = suppliers.entities();
    let products = products.entities();

    for requirement in requirements
        .entities()
        .iter()
        .filter(|r| r.status == RequirementStatus::Open)
    {
        let client = clients.iter().find(|c| c.id == requirement.client_id);
        let matches = ranking::rank(Some(requirement), client, &suppliers, &products);
        match (client, matches.first()) {
            (Some(client), Some(best)) => {
                let draft = synthesis::synthesize(best, requirement, client, &app_config.deals);
                info!(
                    requirement = %requirement.id,
                    score = best.score,
                    candidates = matches.len(),
                    total_value = ?draft.total_value(),
                    "Best match: {}",
                    draft.title
                );
            }
            _ => info!(requirement = %requirement.id, "No eligible supplier product"),
        }
    }

    let pipeline = deals.entities();
    info!(
        deals = pipeline.len(),
        commission = deal::total_commission(&pipeline),
        "Pipeline loaded"
    );

    Ok(())
}

/// Connects and creates missing tables. On failure a disconnected handle is
/// returned so every fetch fails and the fixture lists are used.
async fn connect() -> DatabaseConnection {
    let url = database::get_database_url();
    let db = match database::create_connection(&url).await {
        Ok(db) => db,
        Err(e) => {
            warn!("Database unavailable, continuing with fixture data: {}", e);
            return DatabaseConnection::Disconnected;
        }
    };
    match database::create_tables(&db).await {
        Ok(()) => info!("Database initialized successfully."),
        Err(e) => warn!("Failed to create tables: {}", e),
    }
    db
}
