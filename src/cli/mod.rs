pub mod chat;
pub mod search;

use roam::events::PublishedEvent;

/// Print events as a numbered list, one title line and one detail line each.
pub fn print_events(events: &[PublishedEvent]) {
    if events.is_empty() {
        println!("No events found.");
        return;
    }

    for (i, published) in events.iter().enumerate() {
        let event = &published.event;
        let when = event
            .first_start()
            .map(|ts| ts.format("%a %b %-d, %Y %-I:%M %p").to_string())
            .unwrap_or_else(|| "Date TBD".to_string());
        let place = match &event.town {
            Some(town) => format!("{}, {}", event.location.name, town),
            None => event.location.name.clone(),
        };
        let price = event
            .price
            .as_ref()
            .and_then(|p| p.text.clone())
            .unwrap_or_else(|| "Free".to_string());

        println!("  {}. {} [{}]", i + 1, event.title, published.id);
        println!("     {when} @ {place} (host: {}, {price})", event.host.name);
        println!();
    }
}
