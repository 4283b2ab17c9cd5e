//! `huddle classify` - run the trigger classifier on a piece of text.

use console::style;
use huddle_core::classifier::{classify, detect_language};
use huddle_types::intent::Intent;

pub fn classify_text(text: &str, json: bool) -> anyhow::Result<()> {
    let intent = classify(text);
    let language = detect_language(text);

    if json {
        let out = serde_json::json!({
            "text": text,
            "intent": intent,
            "language": language,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    match &intent {
        Some(intent) => println!(
            "  {} {}{}",
            style("Intent:").bold(),
            style(intent.name()).cyan(),
            detail(intent)
        ),
        None => println!("  {} {}", style("Intent:").bold(), style("none").dim()),
    }
    println!("  {} {}", style("Language:").bold(), language);
    println!();
    Ok(())
}

fn detail(intent: &Intent) -> String {
    match intent {
        Intent::Join { code } => format!(" ({code})"),
        Intent::Commit { text } => format!(" (\"{text}\")"),
        Intent::Contribute { amount, .. } => format!(" ({amount} TZS)"),
        _ => String::new(),
    }
}
