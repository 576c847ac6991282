use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use shared::{
    domain::{template_action_rows, MenuId, MenuTreeNode, Visibility},
    protocol::{HiddenFilter, MenuQuery, MenuSearch, MenuSubmission, DEFAULT_PAGE_SIZE},
};
use storage::Storage;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/menu_admin.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Inserts a sample menu tree into an empty database.
    Seed,
    /// Prints the whole menu tree.
    Tree,
    /// Prints one page of menus.
    List {
        #[arg(long, default_value = "")]
        name: String,
        /// -1 for all, 0 for shown, 1 for hidden.
        #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
        hidden: i64,
        #[arg(long)]
        parent: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,
        #[arg(long)]
        json: bool,
    },
    Create {
        name: String,
        #[arg(long)]
        parent: Option<String>,
        #[arg(long, default_value_t = 0)]
        sequence: i64,
        #[arg(long)]
        hidden: bool,
        #[arg(long, default_value = "")]
        icon: String,
        #[arg(long, default_value = "")]
        router: String,
        /// Attach the add/edit/del/query template actions.
        #[arg(long)]
        template_actions: bool,
    },
    Delete {
        record_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::Seed => seed(&storage).await?,
        Command::Tree => {
            let tree = storage.menu_tree().await?;
            if tree.is_empty() {
                println!("(no menus)");
            }
            print_tree(&tree);
        }
        Command::List {
            name,
            hidden,
            parent,
            page,
            page_size,
            json,
        } => {
            let Ok(hidden) = HiddenFilter::try_from(hidden) else {
                bail!("--hidden must be -1, 0 or 1");
            };
            let query = MenuQuery {
                search: MenuSearch {
                    name,
                    hidden,
                    parent_id: parent.map(MenuId::from),
                },
                current: page.max(1),
                page_size: page_size.max(1),
            };
            let data = storage.query_menus(&query).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                for menu in &data.list {
                    println!(
                        "{}\t{}\t{}\t{}\t{}",
                        menu.record_id,
                        menu.name,
                        menu.sequence,
                        menu.hidden.label(),
                        menu.router
                    );
                }
                println!(
                    "page {} / size {} / total {}",
                    data.pagination.current, data.pagination.page_size, data.pagination.total
                );
            }
        }
        Command::Create {
            name,
            parent,
            sequence,
            hidden,
            icon,
            router,
            template_actions,
        } => {
            let created = storage
                .create_menu(&MenuSubmission {
                    name,
                    sequence,
                    hidden: if hidden {
                        Visibility::Hidden
                    } else {
                        Visibility::Shown
                    },
                    icon,
                    router,
                    parent_id: parent.map(MenuId::from),
                    actions: if template_actions {
                        template_action_rows()
                    } else {
                        Vec::new()
                    },
                })
                .await?;
            println!("created record_id={}", created.record_id);
        }
        Command::Delete { record_id } => {
            storage.delete_menu(&MenuId::from(record_id.as_str())).await?;
            println!("deleted record_id={record_id}");
        }
    }

    Ok(())
}

async fn seed(storage: &Storage) -> Result<()> {
    let existing = storage.list_all_menus().await?;
    if !existing.is_empty() {
        println!("database already holds {} menus; seed skipped", existing.len());
        return Ok(());
    }

    let system = storage
        .create_menu(&submission("システム管理", 9, "setting", "", None, false))
        .await?;
    let children = [
        ("メニュー管理", 3, "bars", "/system/menu"),
        ("ロール管理", 2, "team", "/system/role"),
        ("ユーザー管理", 1, "user", "/system/user"),
    ];
    for (name, sequence, icon, router) in children {
        storage
            .create_menu(&submission(name, sequence, icon, router, Some(&system.record_id), true))
            .await?;
    }
    storage
        .create_menu(&submission("ダッシュボード", 10, "dashboard", "/dashboard", None, false))
        .await?;

    println!("seeded {} menus", children.len() + 2);
    Ok(())
}

fn submission(
    name: &str,
    sequence: i64,
    icon: &str,
    router: &str,
    parent_id: Option<&MenuId>,
    with_actions: bool,
) -> MenuSubmission {
    MenuSubmission {
        name: name.to_string(),
        sequence,
        hidden: Visibility::Shown,
        icon: icon.to_string(),
        router: router.to_string(),
        parent_id: parent_id.cloned(),
        actions: if with_actions {
            template_action_rows()
        } else {
            Vec::new()
        },
    }
}

fn print_tree(tree: &[MenuTreeNode]) {
    let mut stack: Vec<(&MenuTreeNode, usize)> = tree.iter().rev().map(|node| (node, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        println!("{}{} [{}]", "  ".repeat(depth), node.name, node.record_id);
        stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
    }
}
