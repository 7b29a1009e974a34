//! HTML page rendering.
//!
//! Pages are self-contained HTML documents with the CSS inlined.

use magicform_core::builder::BuildOutcome;
use magicform_core::parser::SAMPLE_QUESTIONS_JSON;

/// Escape a string for safe HTML insertion.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn page(title: &str, body: &str) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>{}</title>\n", html_escape(title)));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n<main>\n");
    html.push_str("<h1>Magic - Form Creator</h1>\n");
    html.push_str(body);
    html.push_str("</main>\n</body>\n</html>\n");

    html
}

fn instructions() -> String {
    let mut html = String::new();

    html.push_str("<section class=\"instructions\">\n");
    html.push_str("<h2>How to use this app</h2>\n<ol>\n");
    html.push_str(
        "<li><strong>Create form</strong>: provide a title. A new quiz form is created in your Google account.</li>\n",
    );
    html.push_str(
        "<li><strong>Upload questions</strong>: upload a JSON file with the questions to add. It must follow this format:</li>\n",
    );
    html.push_str("</ol>\n");
    html.push_str(&format!(
        "<pre><code>{}</code></pre>\n",
        html_escape(SAMPLE_QUESTIONS_JSON)
    ));
    html.push_str("<p><a href=\"/sample.json\" download>Download JSON format</a></p>\n");
    html.push_str("</section>\n");

    html
}

/// Landing page for a user who still has to grant access.
pub fn render_authorize(auth_url: &str) -> String {
    let mut body = instructions();
    body.push_str("<section>\n<h2>Create Google Form</h2>\n");
    body.push_str(&format!(
        "<p><a class=\"button\" href=\"{}\">Click here to authorize</a></p>\n",
        html_escape(auth_url)
    ));
    body.push_str("</section>\n");
    page("magicform", &body)
}

/// Landing page with the upload form.
pub fn render_upload_form() -> String {
    let mut body = instructions();
    body.push_str("<section>\n<h2>Create Google Form</h2>\n");
    body.push_str("<form method=\"post\" action=\"/forms\" enctype=\"multipart/form-data\">\n");
    body.push_str("<label for=\"title\">Enter the form title</label>\n");
    body.push_str("<input id=\"title\" name=\"title\" type=\"text\" required>\n");
    body.push_str("<label for=\"questions\">Upload questions JSON file</label>\n");
    body.push_str(
        "<input id=\"questions\" name=\"questions\" type=\"file\" accept=\".json,application/json\" required>\n",
    );
    body.push_str("<button type=\"submit\">Create Form &amp; Wait For Magic</button>\n");
    body.push_str("</form>\n</section>\n");
    page("magicform", &body)
}

/// Result page after a form was built.
pub fn render_result(outcome: &BuildOutcome) -> String {
    let mut body = String::new();

    body.push_str("<section class=\"result\">\n");
    for index in &outcome.questions.skipped {
        body.push_str(&format!(
            "<p class=\"warning\">Skipping question at index {index} due to missing 'title'</p>\n"
        ));
    }
    body.push_str("<p class=\"success\">Questions added to the form.</p>\n");
    body.push_str(&format!(
        "<p class=\"success\">Form created with ID: <code>{}</code></p>\n",
        html_escape(&outcome.form.form_id)
    ));
    let uri = html_escape(&outcome.form.responder_uri);
    body.push_str(&format!(
        "<p class=\"success\">Form URL: <a href=\"{uri}\">{uri}</a></p>\n"
    ));
    body.push_str("<p><a href=\"/\">Create another form</a></p>\n");
    body.push_str("</section>\n");

    page("magicform: form created", &body)
}

/// Error page.
pub fn render_error(message: &str) -> String {
    let body = format!(
        "<section>\n<p class=\"error\">{}</p>\n<p><a href=\"/\">Back</a></p>\n</section>\n",
        html_escape(message)
    );
    page("magicform: error", &body)
}

const CSS: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; margin: 0; background: #f5f7fb; color: #1f2933; }
main { max-width: 860px; margin: 0 auto; padding: 2rem 1rem; }
h1, h2, h3 { color: #1e73df; }
pre { background: #fff; border: 1px solid #d9e2ec; border-radius: 5px; padding: 1rem; overflow-x: auto; }
form { display: flex; flex-direction: column; gap: 0.6rem; max-width: 480px; }
input[type=text] { padding: 0.5rem; border: 1px solid #bcccdc; border-radius: 5px; }
button, .button { background-color: #4e73df; color: #fff; border: none; border-radius: 5px; padding: 0.6rem 1rem; cursor: pointer; text-decoration: none; display: inline-block; }
.success { color: #1b7f3b; }
.warning { color: #b7791f; }
.error { color: #c53030; font-weight: 600; }
"#;
