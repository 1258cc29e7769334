use wechat_miniprogram::{ApiClient, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional: enable basic logging for the example
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    // Reads WECHAT_APP_ID / WECHAT_APP_SECRET
    let cfg = Config::from_env()?;
    let client = ApiClient::new(cfg)?;

    let token = client.fetch_service_token().await?;
    println!("access token valid until {}", token.expires_at());

    if let Some(code) = std::env::args().nth(1) {
        let session = client.exchange_login_code(&code).await?;
        println!("openid: {}", session.open_id);
    }

    client.close();
    Ok(())
}
