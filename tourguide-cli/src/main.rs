use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tourguide_core::{
    format_point, BuiltinSource, Category, ChatClient, Explorer, ExplorerConfig, Feedback, FeedbackSink,
    FixedLocation, IpLocationProvider, JsonFileSource, JsonLinesFeedbackSink, LocationProvider,
    RealtimeDbFeedbackSink, SearchOutcome,
};

mod cli;

fn main() -> Result<()> {
    let args = cli::parse_args();

    // Initialize logger with appropriate level based on verbose flag
    if std::env::var("RUST_LOG").is_err() {
        if args.verbose {
            std::env::set_var("RUST_LOG", "debug");
        } else {
            std::env::set_var("RUST_LOG", "info");
        }
    }
    env_logger::init();

    let mut config = ExplorerConfig::from_env();
    if let Some(url) = &args.database_url {
        config.database_url = Some(url.clone());
    }
    if let Some(radius) = args.radius {
        if !(radius.is_finite() && radius >= 0.0) {
            anyhow::bail!("Radius must be a non-negative number of kilometres");
        }
        config.radius_km = radius;
    }
    if let Some(secs) = args.timeout {
        config.location_timeout = Duration::from_secs(secs);
    }

    if let Some(prompt) = &args.ask {
        return ask_chat(&config, prompt);
    }

    if args.chat_history {
        return show_chat_history(&config);
    }

    if let Some(name) = &args.feedback_name {
        let email = args.feedback_email.as_deref().unwrap_or_default();
        let message = args.feedback_message.as_deref().unwrap_or_default();
        return submit_feedback(&config, &args, name, email, message);
    }

    let explorer = if let Some(path) = &args.data {
        Explorer::new(config, Box::new(JsonFileSource::new(path.clone())))
    } else if args.builtin {
        Explorer::new(config, Box::new(BuiltinSource::new()?))
    } else {
        Explorer::from_config(config)?
    };

    if let Some(city) = &args.heritage {
        return list_heritage(&explorer, city);
    }

    if let Some(category) = args.category {
        return list_category(&explorer, category);
    }

    if args.near {
        return find_nearby(&explorer, &args);
    }

    list_cities(&explorer, args.search.as_deref().unwrap_or(""))
}

fn list_cities(explorer: &Explorer, term: &str) -> Result<()> {
    let cities = explorer.search_cities(term)?;

    if cities.is_empty() {
        if term.trim().is_empty() {
            println!("No cities loaded yet.");
        } else {
            println!("No cities match \"{}\". Try a different term.", term);
        }
        return Ok(());
    }

    for city in &cities {
        println!("{} ({})", city.name, format_point(&city.location));
        println!("    {}", city.description_or_default());
    }
    log::info!("{} cities listed", cities.len());

    Ok(())
}

fn list_heritage(explorer: &Explorer, city: &str) -> Result<()> {
    match explorer.heritage_places(city)? {
        None => println!("No city named \"{}\".", city),
        Some(places) if places.is_empty() => {
            println!("No heritage places listed for {}.", city)
        }
        Some(places) => {
            println!("Heritage places of {}:", city);
            for place in places {
                match &place.year {
                    Some(year) => println!("  {} ({})", place.name, year),
                    None => println!("  {}", place.name),
                }
                if let Some(description) = &place.description {
                    println!("      {}", description);
                }
                if let Some(url) = &place.google_maps_url {
                    println!("      {}", url);
                }
            }
        }
    }
    Ok(())
}

fn list_category(explorer: &Explorer, category: Category) -> Result<()> {
    let entries = match explorer.category(category)? {
        None => {
            println!("No data found for {}.", category.label());
            return Ok(());
        }
        Some(entries) if entries.is_empty() => {
            println!("No {} listed.", category.label());
            return Ok(());
        }
        Some(entries) => entries,
    };

    for entry in &entries {
        match entry.locality() {
            Some(locality) => println!("{} ({})", entry.name, locality),
            None => println!("{}", entry.name),
        }
        if let Some(kind) = &entry.kind {
            println!("    {}", kind);
        }
        if let Some(description) = &entry.description {
            println!("    {}", description);
        }
        if !entry.highlights.is_empty() {
            println!("    Highlights: {}", entry.highlights.join(", "));
        }
        if let Some(best_time) = &entry.best_time_to_visit {
            println!("    Best time to visit: {}", best_time);
        }
        if !entry.facilities.is_empty() {
            println!("    Facilities: {}", entry.facilities.join(", "));
        }
        if let Some(url) = &entry.maps_url {
            println!("    {}", url);
        }
    }
    log::info!("{} {} listed", entries.len(), category.label());

    Ok(())
}

fn find_nearby(explorer: &Explorer, args: &cli::Args) -> Result<()> {
    let config = explorer.config();
    let provider: Arc<dyn LocationProvider> = match args.at {
        Some(point) => Arc::new(FixedLocation(point)),
        None => Arc::new(IpLocationProvider::new(
            config.ip_location_url.clone(),
            config.http_timeout,
        )),
    };

    let mut search = explorer.nearby_search(provider)?;
    search.trigger();
    println!("{}", search.status_message());
    search.wait();

    match search.outcome() {
        SearchOutcome::Found(_) => {
            if let Some(reference) = search.reference() {
                println!("Nearby cities of {}:", format_point(&reference));
            }
            for result in search.results() {
                println!(
                    "  {:<20} {}km away",
                    result.entity.name,
                    result.rounded_km()
                );
            }
        }
        _ => println!("{}", search.status_message()),
    }

    Ok(())
}

fn submit_feedback(
    config: &ExplorerConfig,
    args: &cli::Args,
    name: &str,
    email: &str,
    message: &str,
) -> Result<()> {
    let feedback = match Feedback::new(name, email, message) {
        Ok(feedback) => feedback,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    let sink: Box<dyn FeedbackSink> = match (&args.feedback_file, &config.database_url) {
        (Some(path), _) => Box::new(JsonLinesFeedbackSink::new(path.clone())),
        (None, Some(url)) => Box::new(RealtimeDbFeedbackSink::new(
            url,
            config.auth_token.clone(),
            config.http_timeout,
        )?),
        (None, None) => {
            anyhow::bail!("No database URL configured; use --feedback-file to store feedback locally")
        }
    };

    let key = sink.submit(&feedback)?;
    println!("Feedback submitted successfully! ({})", key);
    Ok(())
}

fn ask_chat(config: &ExplorerConfig, prompt: &str) -> Result<()> {
    let chat = ChatClient::new(&config.chat_backend_url, config.http_timeout)?;

    match chat.health() {
        Ok(true) => {}
        Ok(false) => log::warn!("Chat backend reports it is unhealthy"),
        Err(e) => log::warn!("Chat backend health check failed: {}", e),
    }

    let reply = chat.ask(prompt)?;
    println!("{}", reply.message);
    if let Some(kind) = reply.kind {
        log::debug!("Reply type: {}", kind);
    }
    Ok(())
}

fn show_chat_history(config: &ExplorerConfig) -> Result<()> {
    let chat = ChatClient::new(&config.chat_backend_url, config.http_timeout)?;
    let messages = chat.history()?;

    if messages.is_empty() {
        println!("No chat history.");
    }
    for message in messages {
        println!("[{}] {}", message.role, message.content);
    }
    Ok(())
}
