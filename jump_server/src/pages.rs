use jump_detector::JumpSummary;

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Jump Detection</title>
  <style>
    body { font-family: sans-serif; margin: 2rem; }
    table { border-collapse: collapse; margin-top: 1rem; }
    th, td { border: 1px solid #999; padding: 0.3rem 0.8rem; text-align: right; }
  </style>
</head>
<body>
  <h1>Jump Detection</h1>
"#;

const TAIL: &str = "</body>\n</html>\n";

/// Live page when `results` is `None`, final results otherwise.
pub fn render_index(results: Option<&JumpSummary>) -> String {
    let mut html = String::from(HEAD);
    match results {
        None => {
            html.push_str("  <img src=\"/video_feed\" alt=\"live video\">\n");
            html.push_str("  <p><a href=\"/stop\">Stop</a></p>\n");
        }
        Some(summary) => render_results(&mut html, summary),
    }
    html.push_str(TAIL);
    html
}

fn render_results(html: &mut String, summary: &JumpSummary) {
    html.push_str("  <h2>Results</h2>\n");
    if summary.all_jumps.is_empty() {
        html.push_str("  <p>No jumps detected.</p>\n");
    } else {
        html.push_str(&format!("  <p>Total jumps: {}</p>\n", summary.jump_count));
        html.push_str("  <table>\n    <tr><th>Jump</th><th>Height (m)</th><th>Air Time (s)</th></tr>\n");
        for jump in &summary.all_jumps {
            html.push_str(&format!(
                "    <tr><td>{}</td><td>{:.2}</td><td>{:.2}</td></tr>\n",
                jump.sequence_number, jump.height_m, jump.air_time
            ));
        }
        html.push_str("  </table>\n");
    }
    html.push_str("  <p><a href=\"/\">Start again</a></p>\n");
}
