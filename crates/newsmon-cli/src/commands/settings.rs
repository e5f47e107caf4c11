use anyhow::Result;

use newsmon_core::storage::{Database, SettingsRepository};

pub async fn get(db: &Database, key: &str) -> Result<()> {
    match SettingsRepository::new(db).get(key).await? {
        Some(value) => println!("{}", value),
        None => anyhow::bail!("No setting named '{}'", key),
    }
    Ok(())
}

pub async fn set(db: &Database, key: &str, value: &str) -> Result<()> {
    SettingsRepository::new(db).set(key, value).await?;
    println!("{} = {}", key, value);
    Ok(())
}

pub async fn list(db: &Database) -> Result<()> {
    let settings = SettingsRepository::new(db).all().await?;

    for (key, value) in &settings {
        println!("{} = {}", key, value);
    }

    Ok(())
}
