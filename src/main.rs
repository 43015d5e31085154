use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use product_catalog::auth::{self, Registration};
use product_catalog::catalog::{self, ImageUpdate, NewProduct, ProductFilter, ProductUpdate};
use product_catalog::config::{self, CONFIG_FILENAME, CatalogConfig};
use product_catalog::db::Database;
use product_catalog::imaging::{RustBackend, display_product_image, encode_product_image};
use product_catalog::types::Price;
use product_catalog::{logging, output};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "product-catalog")]
#[command(about = "Product catalog with bounded JPEG image ingestion")]
#[command(long_about = "\
Product catalog with bounded JPEG image ingestion

Users register and log in for a bearer token; authenticated users manage
categories and products. Every product image is normalized on the way in:

  any decodable upload (JPEG, PNG, GIF, BMP, WebP, TIFF)
    -> longer edge at most 800px (never upscaled)
    -> JPEG at quality 75, transparency flattened onto white
    -> stored as bytes + mime type + byte size

Read commands render stored images as data:image/jpeg;base64,... URIs.

Pass the token with --token or the CATALOG_TOKEN environment variable.
--password may likewise come from CATALOG_PASSWORD.
Run 'product-catalog gen-config' to generate a documented catalog.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// Data file (overrides `data_file` from the config)
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    /// Bearer token from `login`
    #[arg(long, env = "CATALOG_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a user account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "CATALOG_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Exchange email + password for a bearer token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CATALOG_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Revoke the current token
    Logout,
    /// Show the user behind the current token
    Whoami,
    /// Manage categories
    #[command(subcommand)]
    Category(CategoryCommand),
    /// Manage products
    #[command(subcommand)]
    Product(ProductCommand),
    /// Run the image pipeline on a file without touching the catalog
    #[command(subcommand)]
    Image(ImageCommand),
    /// Print a stock catalog.toml with all options documented
    GenConfig,
}

#[derive(Subcommand)]
enum CategoryCommand {
    /// Add a category
    Add { name: String },
    /// List categories
    List,
    /// Delete a category no product references
    Delete { id: u64 },
}

#[derive(Subcommand)]
enum ProductCommand {
    /// Create a product owned by the current user
    Create(CreateArgs),
    /// Change fields of a product
    Update(UpdateArgs),
    /// Show one product
    Show { id: u64 },
    /// List products, newest first
    List(ListArgs),
    /// Delete a product
    Delete { id: u64 },
}

#[derive(Subcommand)]
enum ImageCommand {
    /// Encode an image file to a bounded JPEG file
    Encode { input: PathBuf, output: PathBuf },
    /// Encode an image file and print its data URI
    Display { input: PathBuf },
}

#[derive(Args)]
struct CreateArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    category: Option<u64>,
    #[arg(long)]
    purchase_price: Option<Price>,
    #[arg(long)]
    sale_price: Option<Price>,
    /// Image file to attach
    #[arg(long)]
    image: Option<PathBuf>,
}

#[derive(Args)]
struct UpdateArgs {
    id: u64,
    #[arg(long)]
    name: Option<String>,
    #[arg(long, conflicts_with = "clear_description")]
    description: Option<String>,
    #[arg(long)]
    clear_description: bool,
    #[arg(long)]
    category: Option<u64>,
    #[arg(long)]
    purchase_price: Option<Price>,
    #[arg(long)]
    sale_price: Option<Price>,
    /// Replace the image with this file
    #[arg(long, conflicts_with = "remove_image")]
    image: Option<PathBuf>,
    /// Remove the stored image
    #[arg(long)]
    remove_image: bool,
}

#[derive(Args)]
struct ListArgs {
    #[arg(long)]
    category: Option<u64>,
    /// Only products owned by this user id
    #[arg(long)]
    owner: Option<u64>,
    /// Case-insensitive name substring
    #[arg(long)]
    search: Option<String>,
}

/// Everything a command needs besides its own arguments.
struct Context {
    config: CatalogConfig,
    db: Database,
    token: Option<String>,
    json: bool,
    now: DateTime<Utc>,
}

impl Context {
    fn current_user_id(&self) -> Result<u64, auth::AuthError> {
        auth::authenticate(&self.db, self.token.as_deref(), self.now).map(|u| u.id)
    }
}

fn emit<T: Serialize + ?Sized>(
    json: bool,
    value: &T,
    print: impl FnOnce(&T),
) -> serde_json::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print(value);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = config::load_config(&cli.config)?;
    logging::init_logging(&config.logging)?;

    if let Command::Image(command) = cli.command {
        return run_image(command, cli.json);
    }

    let data_file = cli
        .data_file
        .unwrap_or_else(|| PathBuf::from(&config.data_file));
    let db = Database::load(&data_file)?;
    let mut ctx = Context {
        config,
        db,
        token: cli.token,
        json: cli.json,
        now: Utc::now(),
    };

    if run(cli.command, &mut ctx)? {
        ctx.db.save(&data_file)?;
    }
    Ok(())
}

/// Runs a catalog command. Returns whether the database changed.
fn run(command: Command, ctx: &mut Context) -> Result<bool, Box<dyn std::error::Error>> {
    let backend = RustBackend::new();
    match command {
        Command::Register {
            name,
            email,
            password,
        } => {
            let user = auth::register(
                &mut ctx.db,
                &Registration {
                    name,
                    email,
                    password,
                },
                &ctx.config.auth,
                ctx.now,
            )?;
            emit(ctx.json, &user, output::print_user)?;
            Ok(true)
        }
        Command::Login { email, password } => {
            let token = auth::login(&mut ctx.db, &email, &password, &ctx.config.auth, ctx.now)?;
            emit(ctx.json, &token, output::print_token)?;
            Ok(true)
        }
        Command::Logout => {
            auth::logout(&mut ctx.db, ctx.token.as_deref(), ctx.now)?;
            println!("Logged out");
            Ok(true)
        }
        Command::Whoami => {
            let user = auth::authenticate(&ctx.db, ctx.token.as_deref(), ctx.now)?;
            emit(ctx.json, &user, output::print_user)?;
            Ok(false)
        }
        Command::Category(command) => run_category(command, ctx),
        Command::Product(command) => run_product(command, ctx, &backend),
        Command::Image(_) | Command::GenConfig => Ok(false),
    }
}

fn run_category(
    command: CategoryCommand,
    ctx: &mut Context,
) -> Result<bool, Box<dyn std::error::Error>> {
    match command {
        CategoryCommand::Add { name } => {
            ctx.current_user_id()?;
            let category = catalog::add_category(&mut ctx.db, &name, ctx.now)?;
            let added = std::slice::from_ref(&category);
            emit(ctx.json, added, output::print_categories)?;
            Ok(true)
        }
        CategoryCommand::List => {
            let categories = catalog::list_categories(&ctx.db);
            emit(ctx.json, categories.as_slice(), output::print_categories)?;
            Ok(false)
        }
        CategoryCommand::Delete { id } => {
            ctx.current_user_id()?;
            catalog::delete_category(&mut ctx.db, id)?;
            println!("Deleted category #{id}");
            Ok(true)
        }
    }
}

fn run_product(
    command: ProductCommand,
    ctx: &mut Context,
    backend: &RustBackend,
) -> Result<bool, Box<dyn std::error::Error>> {
    match command {
        ProductCommand::Create(args) => {
            let owner_id = ctx.current_user_id()?;
            let image = args.image.as_deref().map(std::fs::read).transpose()?;
            let input = NewProduct {
                name: args.name,
                description: args.description,
                category_id: args.category,
                purchase_price: args.purchase_price,
                sale_price: args.sale_price,
                image,
            };
            let view = catalog::create_product(&mut ctx.db, backend, owner_id, input, ctx.now)?;
            emit(ctx.json, &view, output::print_product_detail)?;
            Ok(true)
        }
        ProductCommand::Update(args) => {
            ctx.current_user_id()?;
            let image = match (args.image, args.remove_image) {
                (Some(path), _) => ImageUpdate::Replace(std::fs::read(&path)?),
                (None, true) => ImageUpdate::Remove,
                (None, false) => ImageUpdate::Keep,
            };
            let description = if args.clear_description {
                Some(None)
            } else {
                args.description.map(Some)
            };
            let update = ProductUpdate {
                name: args.name,
                description,
                category_id: args.category,
                purchase_price: args.purchase_price,
                sale_price: args.sale_price,
                image,
            };
            let view = catalog::update_product(&mut ctx.db, backend, args.id, update, ctx.now)?;
            emit(ctx.json, &view, output::print_product_detail)?;
            Ok(true)
        }
        ProductCommand::Show { id } => {
            let view = catalog::get_product(&ctx.db, id)?;
            emit(ctx.json, &view, output::print_product_detail)?;
            Ok(false)
        }
        ProductCommand::List(args) => {
            let filter = ProductFilter {
                category_id: args.category,
                user_id: args.owner,
                search: args.search,
            };
            let views = catalog::list_products(&ctx.db, &filter)?;
            emit(ctx.json, views.as_slice(), output::print_product_list)?;
            Ok(false)
        }
        ProductCommand::Delete { id } => {
            ctx.current_user_id()?;
            catalog::delete_product(&mut ctx.db, id)?;
            println!("Deleted product #{id}");
            Ok(true)
        }
    }
}

fn run_image(command: ImageCommand, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let backend = RustBackend::new();
    match command {
        ImageCommand::Encode { input, output: out } => {
            let bytes = std::fs::read(&input)?;
            let image = encode_product_image(&backend, Some(&bytes))?;
            if let Some(encoded) = image.encoded_bytes() {
                std::fs::write(&out, encoded)?;
            }
            for line in output::format_encoded_image(bytes.len(), &image) {
                println!("{}", line);
            }
        }
        ImageCommand::Display { input } => {
            let bytes = std::fs::read(&input)?;
            let image = encode_product_image(&backend, Some(&bytes))?;
            let display = display_product_image(&image);
            if json {
                println!("{}", serde_json::to_string(&display)?);
            } else if let Some(uri) = display.as_data_uri() {
                println!("{}", uri);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::ffi::OsStr;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn password_can_come_from_the_environment() {
        let cli = Cli::command();
        for name in ["register", "login"] {
            let sub = cli.find_subcommand(name).unwrap();
            let password = sub
                .get_arguments()
                .find(|arg| arg.get_id() == "password")
                .unwrap();
            assert_eq!(password.get_env(), Some(OsStr::new("CATALOG_PASSWORD")));
            assert!(password.is_hide_env_values_set());
        }
    }

    #[test]
    fn password_flag_still_parses() {
        let args = "product-catalog login --email a@b.co --password x".split(' ');
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Login { email, password } => {
                assert_eq!(email, "a@b.co");
                assert_eq!(password, "x");
            }
            _ => panic!("expected login"),
        }
    }
}
