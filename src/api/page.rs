//! Server-rendered HTML for the recommendation form

use std::fmt::Write;

use super::state::ShellSettings;

/// Sample size shown when a lookup comes back empty
pub const EXAMPLE_SAMPLE_SIZE: usize = 10;

const WELCOME: &str = "Welcome to the Pratilipi Recommendation App!";

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 0; display: flex; min-height: 100vh; }
aside { width: 18rem; padding: 1.5rem; background: #f0f2f6; }
main { flex: 1; padding: 2rem 3rem; }
input[type=text] { width: 100%; padding: .4rem; margin: .5rem 0 1rem; box-sizing: border-box; }
.alert { padding: .75rem 1rem; border-radius: .4rem; margin: 1rem 0; }
.error { background: #ffe0e0; color: #7d1a1a; }
.warning { background: #fff6d6; color: #6b5300; }
.info { background: #e1efff; color: #0b3d91; }
.success { background: #dcf5e3; color: #135f2a; }
"#;

/// What a lookup produced, ready to render
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Found { user_id: String, items: Vec<String> },
    NotFound { example_user_ids: Vec<String> },
    /// The lookup itself broke; shown inline so the form stays usable
    Failed { message: String },
}

/// Minimal escaping for text and attribute values
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders the full page. `input_value` pre-fills the user id field.
pub fn render(
    shell: &ShellSettings,
    mapping_warning: Option<&str>,
    input_value: &str,
    outcome: Option<&Outcome>,
) -> String {
    let title = escape_html(&shell.page_title);
    let mut html = String::new();

    // Writing into a String cannot fail
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n"
    );

    let _ = write!(
        html,
        "<aside>\n<h2>User Input</h2>\n\
         <form method=\"get\" action=\"/recommendations\">\n\
         <label for=\"user_id\">Enter your User ID</label>\n\
         <input type=\"text\" id=\"user_id\" name=\"user_id\" value=\"{}\">\n\
         <button type=\"submit\">Get Recommendations</button>\n</form>\n",
        escape_html(input_value)
    );
    if !shell.example_user_ids.is_empty() {
        html.push_str("<h3>Example User IDs</h3>\n<p>Here are some sample User IDs you can try:</p>\n<ul>\n");
        for id in &shell.example_user_ids {
            let _ = writeln!(html, "<li><strong>{}</strong></li>", escape_html(id));
        }
        html.push_str("</ul>\n");
    }
    html.push_str("</aside>\n<main>\n");

    let _ = write!(
        html,
        "<h1>{title}</h1>\n<p>{WELCOME}<br>\n\
         Enter your User ID to receive personalized story recommendations.</p>\n"
    );

    if let Some(warning) = mapping_warning {
        let _ = writeln!(
            html,
            "<div class=\"alert error\">{}</div>",
            escape_html(warning)
        );
    }

    match outcome {
        Some(Outcome::Found { user_id, items }) => {
            let _ = writeln!(
                html,
                "<div class=\"alert success\">Recommendations for User ID {}:</div>\n<ol>",
                escape_html(user_id)
            );
            for item in items {
                let _ = writeln!(
                    html,
                    "<li><strong>Pratilipi ID: {}</strong></li>",
                    escape_html(item)
                );
            }
            html.push_str("</ol>\n");
        }
        Some(Outcome::NotFound { example_user_ids }) => {
            html.push_str(
                "<div class=\"alert warning\">User not found or no recommendations available.</div>\n",
            );
            let sample: Vec<String> = example_user_ids.iter().map(|id| escape_html(id)).collect();
            let _ = writeln!(
                html,
                "<div class=\"alert info\">Example User IDs: {}</div>",
                sample.join(", ")
            );
        }
        Some(Outcome::Failed { message }) => {
            let _ = writeln!(
                html,
                "<div class=\"alert error\">{}</div>",
                escape_html(message)
            );
        }
        None => {}
    }

    html.push_str("</main>\n</body>\n</html>\n");
    html
}
