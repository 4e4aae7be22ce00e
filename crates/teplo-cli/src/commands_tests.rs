use indoc::indoc;
use teplo_profile::Profile;

use crate::commands::{render_lines, render_stats};

fn fixture() -> Profile {
    Profile::from_json(indoc! {r#"
        {
          "samples": [
            {
              "values": [1, 300],
              "stack": [ { "lines": [ { "function": "pkg.hot", "line": 12 } ] } ]
            },
            {
              "values": [1, 200],
              "stack": [ { "lines": [ { "function": "pkg.hot", "line": 12 } ] } ]
            },
            {
              "values": [1, 40],
              "stack": [ { "lines": [ { "function": "pkg.cold", "line": 7 } ] } ]
            }
          ]
        }
    "#})
    .unwrap()
}

#[test]
fn stats_orders_functions_by_cumulative_weight() {
    let out = render_stats(&fixture());
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "3 samples");
    assert!(lines[1].ends_with("pkg.hot"));
    assert!(lines[1].contains("500"));
    assert!(lines[2].ends_with("pkg.cold"));
}

#[test]
fn lines_reports_the_first_cumulative_value() {
    let out = render_lines(&fixture(), "pkg.hot");
    assert!(out.contains("line    12: 2 samples, counter 300"));
}

#[test]
fn lines_for_unknown_function_is_empty() {
    let out = render_lines(&fixture(), "pkg.missing");
    assert_eq!(out, "pkg.missing\n");
}
