use clap::Subcommand;
use postpulse_core::{Setting, TenantId};

/// Sub-commands available under `settings`.
#[derive(Debug, Subcommand)]
pub enum SettingsCommands {
    /// Store a value, replacing any previous one
    Set {
        #[arg(long, env = "POSTPULSE_TENANT")]
        tenant: TenantId,
        key: String,
        value: String,
    },
    /// List stored settings with values masked
    List {
        #[arg(long, env = "POSTPULSE_TENANT")]
        tenant: TenantId,
    },
}

/// # Errors
///
/// Returns an error if the key is blank or the database operation fails.
pub(crate) async fn run(pool: &sqlx::PgPool, command: SettingsCommands) -> anyhow::Result<()> {
    match command {
        SettingsCommands::Set { tenant, key, value } => {
            let key = key.trim();
            anyhow::ensure!(!key.is_empty(), "setting key must not be empty");
            let row = postpulse_db::upsert_setting(pool, &tenant, key, &value).await?;
            let setting = Setting::from(row).masked();
            println!("{} = {}", setting.key, setting.value);
        }
        SettingsCommands::List { tenant } => {
            let rows = postpulse_db::list_settings(pool, &tenant).await?;
            if rows.is_empty() {
                println!("no settings stored for tenant '{tenant}'");
                return Ok(());
            }
            println!("{:<28}{:<22}UPDATED", "KEY", "VALUE");
            for row in rows {
                let setting = Setting::from(row).masked();
                println!(
                    "{:<28}{:<22}{}",
                    setting.key,
                    setting.value,
                    setting.updated_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
    }
    Ok(())
}
