use std::collections::HashMap;

use regex::Regex;
use serde::Serialize;

const BOUNDS_PATTERN: &str = r"\[(\d+),(\d+)\]\[(\d+),(\d+)\]";
const ATTR_PATTERN: &str = r#"([\w-]+)="([^"]*)""#;

/// `[left,top][right,bottom]` rectangle from a uiautomator `bounds`
/// attribute. Containment is inclusive on all four sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounds {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl Bounds {
    pub fn contains(&self, x: i64, y: i64) -> bool {
        self.left <= x && x <= self.right && self.top <= y && y <= self.bottom
    }

    pub fn area(&self) -> i64 {
        (self.right - self.left) * (self.bottom - self.top)
    }
}

/// One element from a UI dump: its rectangle plus every `name="value"`
/// attribute found on its source line (`bounds` included, bracketed form).
#[derive(Debug, Clone, Serialize)]
pub struct UiNode {
    pub bounds: Bounds,
    pub attributes: HashMap<String, String>,
}

/// Scans the dump line by line and extracts a record for every line carrying
/// a bounds rectangle. Lines without one are ignored, never an error; the
/// uiautomator prologue and closing tags fall out naturally.
pub fn parse_dump_nodes(xml: &str) -> Vec<UiNode> {
    let Ok(bounds_re) = Regex::new(BOUNDS_PATTERN) else {
        return Vec::new();
    };
    let Ok(attr_re) = Regex::new(ATTR_PATTERN) else {
        return Vec::new();
    };

    let mut nodes = Vec::new();
    for line in xml.lines() {
        let Some(caps) = bounds_re.captures(line) else {
            continue;
        };
        let coord = |index: usize| {
            caps.get(index)
                .and_then(|group| group.as_str().parse::<i64>().ok())
        };
        let (Some(left), Some(top), Some(right), Some(bottom)) =
            (coord(1), coord(2), coord(3), coord(4))
        else {
            continue;
        };
        let mut attributes = HashMap::new();
        for attr in attr_re.captures_iter(line) {
            attributes.insert(attr[1].to_string(), attr[2].to_string());
        }
        nodes.push(UiNode {
            bounds: Bounds {
                left,
                top,
                right,
                bottom,
            },
            attributes,
        });
    }
    nodes
}

/// Flat-scan point lookup: among all rectangles containing the point, keep
/// the one with the smallest area, ties going to the first in scan order.
/// Smallest-area stands in for "innermost element" without needing the tree.
pub fn node_at_point(nodes: &[UiNode], x: i64, y: i64) -> Option<&UiNode> {
    let mut best: Option<&UiNode> = None;
    for node in nodes {
        if !node.bounds.contains(x, y) {
            continue;
        }
        match best {
            Some(current) if current.bounds.area() <= node.bounds.area() => {}
            _ => best = Some(node),
        }
    }
    best
}

/// A UI-hierarchy snapshot pulled from one device at one point in time.
/// Queries take the handle explicitly, so there is no hidden "last dump"
/// state shared between calls.
#[derive(Debug, Clone, Serialize)]
pub struct UiDump {
    pub device: String,
    pub captured_at: String,
    pub xml: String,
}

impl UiDump {
    /// Whether `prop="query"` occurs anywhere in the markup. `prop` defaults
    /// to `text`. Case-sensitive, independent of line breaks.
    pub fn contains_attribute(&self, query: &str, prop: Option<&str>) -> bool {
        let needle = format!("{}=\"{}\"", prop.unwrap_or("text"), query);
        self.xml.contains(&needle)
    }

    pub fn nodes(&self) -> Vec<UiNode> {
        parse_dump_nodes(&self.xml)
    }
}
