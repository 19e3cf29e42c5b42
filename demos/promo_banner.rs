//! Promo banner example - describes product photos, then generates a banner.
//!
//! Run with: `cargo run --example promo_banner -- <photo.jpg>... [--customize "text"]`
//!
//! Requires `GOOGLE_API_KEY` and `BANNR_BANNER_URL` environment variables.

use bannr::{Config, ImageRef, SessionState};

#[tokio::main]
async fn main() -> bannr::Result<()> {
    let mut images = Vec::new();
    let mut customization = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--customize" {
            customization = args.next();
        } else {
            images.push(ImageRef::new(arg));
        }
    }
    if images.is_empty() {
        eprintln!("Usage: promo_banner <photo>... [--customize <text>]");
        return Ok(());
    }

    let session = Config::from_env()?.controller()?;
    session.observe(|state| match state {
        SessionState::DescriptionReady { text } => println!("Products: {text}"),
        SessionState::Loading => println!("Working..."),
        _ => {}
    });

    let handle = session.submit(images, customization)?;
    let mut updates = session.subscribe();
    while !updates.borrow_and_update().is_terminal() {
        if updates.changed().await.is_err() {
            break;
        }
    }

    match handle.await {
        Ok(Some(SessionState::ImageReady { url })) => println!("Banner: {url}"),
        Ok(Some(SessionState::Failed { message })) => eprintln!("Failed: {message}"),
        Ok(other) => eprintln!("Unexpected outcome: {other:?}"),
        Err(e) => eprintln!("Pipeline task panicked: {e}"),
    }

    Ok(())
}
