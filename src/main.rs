use std::io::{self, BufRead, Write};

use anyhow::Context;

use agoratui::cli::Flags;
use agoratui::controllers::{app_controller, post_controller};
use agoratui::models::{ApiClient, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let flags = Flags::from_args();

    let (mut config, config_path) = Config::load().context(
        "no usable config; create ~/.config/agoratui/config.json with at least {\"server\": \"https://...\"}",
    )?;

    let client = ApiClient::new(&config.server, config.token.clone())?;

    if flags.post() {
        let note = post_controller::create_post_via_editor(None)?;
        post_controller::publish(&client, note).await?;
        println!("published");
    } else if flags.fetch() {
        app_controller::init_feed(&client, &mut config, &config_path).await?;
        println!("feed cache refreshed");
    } else if flags.login() {
        let (username, password) = prompt_credentials()?;
        client.login(&username, &password).await?;
        config.set_token(client.token().await);
        config.save(&config_path)?;
        println!("logged in as {}", username);
    } else if flags.register() {
        let (username, password) = prompt_credentials()?;
        client.register(&username, &password).await?;
        config.set_token(client.token().await);
        config.save(&config_path)?;
        println!("registered as {}", username);
    } else {
        app_controller::start_app(client, config, config_path).await?;
    }

    Ok(())
}

fn prompt_credentials() -> anyhow::Result<(String, String)> {
    let mut username = String::new();
    print!("username: ");
    io::stdout().flush()?;
    io::stdin().lock().read_line(&mut username)?;

    let mut password = String::new();
    print!("password: ");
    io::stdout().flush()?;
    io::stdin().lock().read_line(&mut password)?;

    Ok((username.trim().to_string(), password.trim().to_string()))
}
