//! Minimal typed subset of the Plotly figure schema.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    Scatter,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: TraceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub x: Vec<Value>,
    pub y: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub text: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovertemplate: Option<String>,
}

impl Trace {
    pub fn line(name: impl Into<String>) -> Self {
        Self::new(TraceKind::Scatter, Some("lines+markers"), Some(name.into()))
    }

    pub fn markers(name: impl Into<String>) -> Self {
        Self::new(TraceKind::Scatter, Some("markers"), Some(name.into()))
    }

    pub fn bar() -> Self {
        Self::new(TraceKind::Bar, None, None)
    }

    fn new(kind: TraceKind, mode: Option<&'static str>, name: Option<String>) -> Self {
        Self {
            kind,
            mode,
            name,
            x: Vec::new(),
            y: Vec::new(),
            text: Vec::new(),
            hovertemplate: None,
        }
    }

    /// Append a point; `None` becomes a JSON null gap.
    pub fn push(&mut self, x: impl Into<Value>, y: Option<f64>) {
        self.x.push(x.into());
        self.y.push(y.map(Value::from).unwrap_or(Value::Null));
    }

    pub fn push_labelled(&mut self, x: impl Into<Value>, y: Option<f64>, label: String) {
        self.push(x, y);
        self.text.push(label);
    }

    pub fn with_hover(mut self, template: &str) -> Self {
        self.hovertemplate = Some(template.to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: Title,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categoryorder: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categoryarray: Vec<String>,
}

impl Axis {
    pub fn titled(text: &str) -> Self {
        Self {
            title: Title {
                text: text.to_string(),
            },
            categoryorder: None,
            categoryarray: Vec::new(),
        }
    }

    /// Categorical axis pinned to the given order.
    pub fn ordered(text: &str, categories: &[&str]) -> Self {
        Self {
            categoryorder: Some("array"),
            categoryarray: categories.iter().map(|value| value.to_string()).collect(),
            ..Self::titled(text)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub dash: &'static str,
    pub width: u32,
}

/// Reference line spanning the plot area along one axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shape {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub xref: &'static str,
    pub yref: &'static str,
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
    pub line: Line,
}

impl Shape {
    pub fn dashed_vline(x: f64) -> Self {
        Self {
            kind: "line",
            xref: "x",
            yref: "paper",
            x0: x,
            x1: x,
            y0: 0.0,
            y1: 1.0,
            line: dashed(),
        }
    }

    pub fn dashed_hline(y: f64) -> Self {
        Self {
            kind: "line",
            xref: "paper",
            yref: "y",
            x0: 0.0,
            x1: 1.0,
            y0: y,
            y1: y,
            line: dashed(),
        }
    }
}

fn dashed() -> Line {
    Line {
        dash: "dash",
        width: 1,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: Title,
    pub xaxis: Axis,
    pub yaxis: Axis,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shapes: Vec<Shape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: Title,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    pub fn new(title: impl Into<String>, xaxis: Axis, yaxis: Axis) -> Self {
        Self {
            data: Vec::new(),
            layout: Layout {
                title: Title { text: title.into() },
                xaxis,
                yaxis,
                shapes: Vec::new(),
                legend: None,
            },
        }
    }

    pub fn with_legend(mut self, title: &str) -> Self {
        self.layout.legend = Some(Legend {
            title: Title {
                text: title.to_string(),
            },
        });
        self
    }

    pub fn points(&self) -> usize {
        self.data.iter().map(Trace::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn serializes_plotly_field_names() {
        let mut figure = Figure::new("T", Axis::titled("x"), Axis::titled("y"));
        let mut trace = Trace::markers("Nursing");
        trace.push(0.5, None);
        figure.data.push(trace);
        figure.layout.shapes.push(Shape::dashed_hline(60.0));

        let value = serde_json::to_value(&figure).expect("serialize figure");
        assert_eq!(value["data"][0]["type"], json!("scatter"));
        assert_eq!(value["data"][0]["mode"], json!("markers"));
        assert_eq!(value["data"][0]["y"], json!([null]));
        assert!(value["data"][0].get("text").is_none());
        assert_eq!(value["layout"]["shapes"][0]["yref"], json!("y"));
        assert_eq!(value["layout"]["shapes"][0]["line"]["dash"], json!("dash"));
    }
}
