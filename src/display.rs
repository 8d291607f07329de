use crate::core::{AIModel, ChatMessage, ModelParameters, PromptTemplate, Role};
use crate::prompts::SavedPrompt;
use chrono::Local;
use console::{measure_text_width, style};

fn box_width(max: usize) -> usize {
    let term = console::Term::stdout();
    let terminal_width = term.size().1 as usize;
    std::cmp::min(terminal_width.saturating_sub(4), max).max(40)
}

/// Wrap a line to `max_width` display columns, breaking at spaces when possible.
pub fn wrap_line(line: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in line.split(' ') {
        let candidate_width = if current.is_empty() {
            measure_text_width(word)
        } else {
            measure_text_width(&current) + 1 + measure_text_width(word)
        };
        if candidate_width <= max_width {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        // a single word wider than the box is cut at character boundaries
        let mut piece = String::new();
        for ch in word.chars() {
            if measure_text_width(&piece) + measure_text_width(&ch.to_string()) > max_width {
                lines.push(std::mem::take(&mut piece));
            }
            piece.push(ch);
        }
        current = piece;
    }
    lines.push(current);
    lines
}

/// Display a reply in a formatted box
pub fn display_response(response: &str) {
    let max_width = box_width(120);

    let wrapped_lines: Vec<String> = response
        .lines()
        .flat_map(|line| wrap_line(line, max_width.saturating_sub(4)))
        .collect();

    let content_max_len = wrapped_lines
        .iter()
        .map(|line| measure_text_width(line))
        .max()
        .unwrap_or(0);
    let width = std::cmp::min(max_width, content_max_len + 4);

    let top_border = "┌".to_string() + &"─".repeat(width - 2) + "┐";
    let bottom_border = "└".to_string() + &"─".repeat(width - 2) + "┘";

    println!("\n{}", style("AI RESPONSE").bold().blue());
    println!("{}", style(&top_border).dim().blue());
    for line in wrapped_lines {
        let padding = width.saturating_sub(measure_text_width(&line) + 3);
        println!("│ {}{}│", style(&line).bold().white(), " ".repeat(padding));
    }
    println!("{}", style(&bottom_border).dim().blue());
}

pub fn display_markdown(text: &str) {
    termimad::print_text(text);
}

/// Print an assistant reply, rendering markdown when the text looks like it.
pub fn display_reply(message: &ChatMessage) {
    let header = match &message.model {
        Some(model) => format!("{} {}", style("assistant").bold().green(), style(model).dim()),
        None => style("assistant").bold().green().to_string(),
    };
    println!("\n{}", header);

    if looks_like_markdown(&message.content) {
        display_markdown(&message.content);
    } else {
        println!("{}", message.content);
    }
}

pub fn looks_like_markdown(text: &str) -> bool {
    text.contains("```") || text.contains('*') || text.contains('`') || text.contains('#')
}

pub fn display_error(message: &str) {
    eprintln!("{} {}", style("error:").bold().red(), message);
}

pub fn display_notice(message: &str) {
    println!("{}", style(message).dim());
}

pub fn display_banner(model: Option<&str>, backend: &str) {
    println!(
        "{} {}",
        style("Aether").bold().magenta(),
        style(format!("({} backend)", backend)).dim()
    );
    match model {
        Some(model) => println!("Model: {}", style(model).cyan()),
        None => println!("No model selected. Use /models and /model <id>."),
    }
    println!("Type /help for commands, /quit or Ctrl+D to exit.\n");
}

pub fn format_message(message: &ChatMessage, index: usize) -> String {
    let role = match message.role {
        Role::User => style("user").bold().cyan(),
        Role::Assistant => style("assistant").bold().green(),
        Role::System => style("system").bold().yellow(),
    };
    let time = message.timestamp.with_timezone(&Local).format("%H:%M:%S");
    let model = message
        .model
        .as_deref()
        .map(|m| format!(" [{}]", m))
        .unwrap_or_default();
    format!(
        "{} {} {}{}\n{}",
        style(format!("#{}", index)).dim(),
        role,
        style(time).dim(),
        style(model).dim(),
        message.content
    )
}

pub fn format_model(model: &AIModel, selected: bool) -> String {
    let marker = if selected { "*" } else { " " };
    format!(
        "{} {} {} - {} (max {} tokens; {})\n    {}",
        style(marker).bold().green(),
        style(&model.id).bold(),
        style(format!("[{}]", model.provider)).dim(),
        model.name,
        model.max_tokens,
        model.supported_features.join(", "),
        style(&model.description).dim()
    )
}

pub fn format_parameters(params: &ModelParameters) -> String {
    format!(
        "temperature        {}\nmax_tokens         {}\ntop_p              {}\nfrequency_penalty  {}\npresence_penalty   {}",
        params.temperature,
        params.max_tokens,
        params.top_p,
        params.frequency_penalty,
        params.presence_penalty
    )
}

pub fn format_template(template: &PromptTemplate, current: bool) -> String {
    let marker = if current { "*" } else { " " };
    format!(
        "{} {} {} - {}\n    {}",
        style(marker).bold().green(),
        style(&template.id).bold(),
        style(format!("[{}]", template.category)).dim(),
        template.name,
        style(&template.description).dim()
    )
}

/// The parameter form for a template: each name, default and description.
pub fn format_template_form(template: &PromptTemplate) -> String {
    let mut lines = vec![format!(
        "{} {}",
        style(&template.name).bold(),
        style(format!("[{}]", template.category)).dim()
    )];
    for param in &template.parameters {
        let default = match &param.default_value {
            serde_json::Value::String(s) if s.is_empty() => String::new(),
            serde_json::Value::String(s) => format!(" (default: {})", s),
            serde_json::Value::Null => String::new(),
            other => format!(" (default: {})", other),
        };
        lines.push(format!(
            "  {}{} - {}",
            style(&param.name).cyan(),
            style(default).dim(),
            param.description
        ));
    }
    if !template.parameters.is_empty() {
        lines.push(
            style("Fill in with /apply name=value ...")
                .dim()
                .to_string(),
        );
    }
    lines.join("\n")
}

pub fn format_saved_prompt(prompt: &SavedPrompt) -> String {
    let preview: String = prompt.content.lines().next().unwrap_or("").chars().take(60).collect();
    format!(
        "{} {} {}\n    {}",
        style(&prompt.name).bold(),
        style(format!("[{}]", prompt.category)).dim(),
        style(&prompt.id).dim(),
        preview
    )
}
