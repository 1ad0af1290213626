use crate::dashboard::Section;
use crate::errors::Result;

pub const DASHBOARD_TITLE: &str = "Quality Enhancement Dashboard";
pub const DISCLAIMER: &str = "All data are synthetic and for demonstration only.";
pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Render the sections into one self-contained page that loads plotly.js from the CDN.
pub fn render_html(sections: &[Section]) -> Result<String> {
    let mut parts = vec![
        "<!DOCTYPE html>".to_string(),
        "<html lang=\"en\">".to_string(),
        "<head>".to_string(),
        "<meta charset=\"utf-8\">".to_string(),
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">".to_string(),
        format!("<title>{}</title>", escape_html(DASHBOARD_TITLE)),
        format!("<script src=\"{PLOTLY_CDN}\" charset=\"utf-8\"></script>"),
        "<style>body{font-family:sans-serif;margin:2rem;}.figure{width:100%;height:480px;}</style>"
            .to_string(),
        "</head>".to_string(),
        "<body>".to_string(),
        format!("<h1>{}</h1>", escape_html(DASHBOARD_TITLE)),
        format!("<p>{}</p>", escape_html(DISCLAIMER)),
    ];

    for (index, section) in sections.iter().enumerate() {
        let id = format!("figure-{}", index + 1);
        let figure = serde_json::to_string(&section.figure)?;
        parts.push("<section>".to_string());
        parts.push(format!("<h2>{}</h2>", escape_html(section.title)));
        parts.push(format!("<div id=\"{id}\" class=\"figure\"></div>"));
        parts.push(format!(
            "<script>(function(){{var fig={};Plotly.newPlot(\"{id}\",fig.data,fig.layout,{{responsive:true}});}})();</script>",
            escape_script(&figure)
        ));
        parts.push("</section>".to_string());
    }

    parts.push("</body>".to_string());
    parts.push("</html>".to_string());
    Ok(parts.join("\n"))
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// JSON embedded in a `<script>` must not close the element early.
fn escape_script(json: &str) -> String {
    json.replace("</", "<\\/").replace("<!--", "<\\!--")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::{Axis, Figure};

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html("Low satisfaction & pass <at-risk> \"q\" 'a'"),
            "Low satisfaction &amp; pass &lt;at-risk&gt; &quot;q&quot; &#39;a&#39;"
        );
    }

    #[test]
    fn script_payload_cannot_close_the_tag() {
        let section = Section {
            title: "Modules & <Risk>",
            figure: Figure::new("</script><b>", Axis::titled("x"), Axis::titled("y")),
        };
        let html = render_html(&[section]).expect("render");
        assert!(html.contains("<h2>Modules &amp; &lt;Risk&gt;</h2>"));
        assert!(!html.contains("</script><b>"));
        assert_eq!(html.matches("Plotly.newPlot").count(), 1);
    }
}
