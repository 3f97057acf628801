use crate::error::{BatchError, Result};
use crate::settings::{load_settings, save_settings, Profile};

fn mask(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    if token.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{visible}…")
    }
}

pub fn set(name: &str, url: &str, token: &str) -> Result<()> {
    let mut settings = load_settings();
    settings.profiles.insert(
        name.to_string(),
        Profile {
            api_url: url.to_string(),
            api_token: token.to_string(),
        },
    );
    save_settings(&settings)?;
    println!("Profile '{name}' saved");
    Ok(())
}

pub fn list() -> Result<()> {
    let settings = load_settings();
    if settings.profiles.is_empty() {
        println!("No profiles saved. Add one with `nibo-batch profile set <name> --token <token>`.");
        return Ok(());
    }
    for (name, profile) in &settings.profiles {
        println!("{name}  {}  {}", profile.api_url, mask(&profile.api_token));
    }
    Ok(())
}

pub fn remove(name: &str) -> Result<()> {
    let mut settings = load_settings();
    if settings.profiles.remove(name).is_none() {
        return Err(BatchError::UnknownProfile(name.to_string()));
    }
    save_settings(&settings)?;
    println!("Profile '{name}' removed");
    Ok(())
}
