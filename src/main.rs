//! shop-admin - command-line front end for the shop administration console

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shop_admin::api::{ApiClient, MenuService, OrderService, Resource, ResourceService};
use shop_admin::auth::Route;
use shop_admin::views::{Confirm, Console, Dashboard, EntityScreen, FixedAnswer, Navigation, Notifier, OrdersScreen, TracingNotifier};
use shop_admin::{AdminConfig, Category, Customer, EntityId, Order, OrderDraft, PageRequest, Product};

#[derive(Parser)]
#[command(name = "shop-admin")]
#[command(version, about = "Administrative console for the shop backend", long_about = None)]
struct Cli {
    /// Answer yes to every delete confirmation
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage customers
    Customers {
        #[command(subcommand)]
        action: EntityAction,
    },
    /// Manage categories
    Categories {
        #[command(subcommand)]
        action: EntityAction,
    },
    /// Manage products
    Products {
        #[command(subcommand)]
        action: EntityAction,
    },
    /// Manage orders and their line items (requires the admin role)
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Show the menu entries enabled for the session
    Menu,
    /// Print the identity provider sign-in URL
    LoginUrl {
        /// Route to return to after sign-in
        #[arg(default_value = "dashboard")]
        route: String,
    },
    /// Print the identity provider sign-out URL
    LogoutUrl,
}

#[derive(Subcommand)]
enum EntityAction {
    /// List one page
    List {
        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Page size (default: DEFAULT_PAGE_SIZE)
        #[arg(short, long)]
        size: Option<u32>,
    },
    /// Show one record
    Show { id: i64 },
    /// Delete one record after confirmation
    Delete { id: i64 },
    /// Create or update from JSON; an id of 0 or no id creates
    Save {
        /// JSON body, or @path to read it from a file
        json: String,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    #[command(flatten)]
    Common(EntityAction),
    /// List the line items of an order
    Details { id: i64 },
    /// List the order statuses
    Statuses,
}

/// Reads y/N from the terminal.
struct StdinConfirm;

#[async_trait]
impl Confirm for StdinConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        let mut stdout = tokio::io::stdout();
        if stdout.write_all(format!("{prompt} [y/N] ").as_bytes()).await.is_err() || stdout.flush().await.is_err() {
            return false;
        }
        let mut line = String::new();
        match BufReader::new(tokio::io::stdin()).read_line(&mut line).await {
            Ok(_) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)).init();

    let cli = Cli::parse();
    let config = AdminConfig::from_env().context("loading configuration")?;
    let console = Console::from_config(&config).context("reading session tokens")?;

    match &cli.command {
        Commands::LoginUrl { route } => {
            println!("{}", console.gate().login_url(route.parse()?)?);
            return Ok(());
        }
        Commands::LogoutUrl => {
            println!("{}", console.logout_url()?);
            return Ok(());
        }
        _ => {}
    }

    let route = match &cli.command {
        Commands::Customers { .. } => Route::Customers,
        Commands::Categories { .. } => Route::Categories,
        Commands::Products { .. } => Route::Products,
        Commands::Orders { .. } => Route::Orders,
        _ => Route::Dashboard,
    };
    if let Navigation::Login { reason, url, .. } = console.navigate(route) {
        match url {
            Some(url) => bail!("{reason}. Sign in at {url}"),
            None => bail!("{reason}. Set AUTH_DOMAIN and AUTH_CLIENT_ID to get a sign-in URL"),
        }
    }

    let client = ApiClient::new(&config)?;
    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
    let confirm: Arc<dyn Confirm> = if cli.yes { Arc::new(FixedAnswer(true)) } else { Arc::new(StdinConfirm) };
    let page_size = config.default_page_size;

    match cli.command {
        Commands::Customers { action } => run_entity::<Customer>(&client, action, page_size, notifier, confirm).await,
        Commands::Categories { action } => run_entity::<Category>(&client, action, page_size, notifier, confirm).await,
        Commands::Products { action } => run_entity::<Product>(&client, action, page_size, notifier, confirm).await,
        Commands::Orders { action } => run_orders(&client, action, page_size, notifier, confirm).await,
        Commands::Menu => {
            let mut dashboard = Dashboard::new(MenuService::new(client), notifier);
            if !dashboard.load().await {
                bail!("menu could not be loaded");
            }
            print_json(&dashboard.menu())
        }
        Commands::LoginUrl { .. } | Commands::LogoutUrl => Ok(()),
    }
}

async fn run_entity<T: Resource>(
    client: &ApiClient,
    action: EntityAction,
    page_size: u32,
    notifier: Arc<dyn Notifier>,
    confirm: Arc<dyn Confirm>,
) -> Result<()> {
    let service = ResourceService::<T>::new(client.clone());
    let mut screen = EntityScreen::new(service.clone(), page_size, notifier, confirm);

    match action {
        EntityAction::List { page, size } => {
            let request = PageRequest::new(page.saturating_sub(1), size.unwrap_or(page_size));
            if !screen.on_page_change(request).await {
                bail!("could not load {}", T::PATH);
            }
            println!("{} of {} {}", screen.list().items().len(), screen.list().total_count(), T::PATH);
            print_json(&screen.list().items())
        }
        EntityAction::Show { id } => print_json(&service.get(EntityId::new(id)).await?),
        EntityAction::Delete { id } => {
            let entity = service.get(EntityId::new(id)).await?;
            if !screen.delete(&entity).await? {
                println!("Cancelled");
            }
            Ok(())
        }
        EntityAction::Save { json } => {
            let entity: T = read_body(&json).await?;
            screen.dialog().open(entity);
            print_json(&screen.submit().await?)
        }
    }
}

async fn run_orders(
    client: &ApiClient,
    action: OrderAction,
    page_size: u32,
    notifier: Arc<dyn Notifier>,
    confirm: Arc<dyn Confirm>,
) -> Result<()> {
    let service = OrderService::new(client.clone());
    let mut screen = OrdersScreen::new(service.clone(), page_size, notifier, confirm);

    match action {
        OrderAction::Common(EntityAction::List { page, size }) => {
            let request = PageRequest::new(page.saturating_sub(1), size.unwrap_or(page_size));
            if !screen.on_page_change(request).await {
                bail!("could not load orders");
            }
            println!("{} of {} orders", screen.list().items().len(), screen.list().total_count());
            print_json(&screen.list().items())
        }
        OrderAction::Common(EntityAction::Show { id }) => {
            let id = EntityId::new(id);
            let (order, details) = futures::try_join!(service.get(id), service.details(id))?;
            print_json(&Order { order_details: details, ..order })
        }
        OrderAction::Common(EntityAction::Delete { id }) => {
            let order = service.get(EntityId::new(id)).await?;
            if !screen.delete(&order).await? {
                println!("Cancelled");
            }
            Ok(())
        }
        OrderAction::Common(EntityAction::Save { json }) => {
            let order: Order = read_body(&json).await?;
            screen.dialog().open(OrderDraft::new(order));
            let outcome = screen.submit().await?;
            for failure in &outcome.failures {
                eprintln!("line item {}: {}", failure.index + 1, failure.error);
            }
            print_json(&Order { order_details: outcome.saved, ..outcome.order })
        }
        OrderAction::Details { id } => print_json(&screen.show_details(EntityId::new(id)).await?),
        OrderAction::Statuses => print_json(&service.statuses().await?),
    }
}

async fn read_body<T: DeserializeOwned>(arg: &str) -> Result<T> {
    let text = match arg.strip_prefix('@') {
        Some(path) => tokio::fs::read_to_string(path).await.with_context(|| format!("reading {path}"))?,
        None => arg.to_string(),
    };
    serde_json::from_str(&text).context("parsing JSON body")
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
