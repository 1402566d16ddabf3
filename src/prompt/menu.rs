//! Text layout of numbered selection menus

use crate::tables::{Menu, Table};

/// Header block: `=` rule, the header, a `-` underline, a blank line
pub fn render_header(header: &str) -> String {
    format!(
        "{}\n{}\n{}\n\n",
        crate::logging::banner_rule(),
        header,
        "-".repeat(header.chars().count())
    )
}

/// Lay out `menu` in `columns` columns with right-justified ordinals
///
/// Entries show the first column of their table row when a table is given,
/// so labels keep the case they were written with.
pub fn render_menu(menu: &Menu, table: Option<&Table>, columns: usize) -> String {
    let columns = columns.max(1);
    let ordinal_width = menu.len().to_string().len();

    let labels: Vec<(usize, &str)> = menu
        .iter()
        .map(|(ordinal, key)| {
            let label = table
                .and_then(|t| t.get(key))
                .and_then(|row| row.first())
                .map(String::as_str)
                .unwrap_or(key);
            (ordinal, label)
        })
        .collect();
    let label_width = labels
        .iter()
        .map(|(_, label)| label.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for line in labels.chunks(columns) {
        let cells: Vec<String> = line
            .iter()
            .map(|(ordinal, label)| {
                format!("{:>ow$} : {:<lw$}", ordinal, label, ow = ordinal_width, lw = label_width)
            })
            .collect();
        out.push_str(cells.join("   ").trim_end());
        out.push('\n');
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_underline_matches_text() {
        let header = render_header("Gateways");
        let lines: Vec<_> = header.lines().collect();
        assert_eq!(lines[0].len(), 72);
        assert_eq!(lines[1], "Gateways");
        assert_eq!(lines[2], "--------");
        assert_eq!(lines[3], "");
    }

    #[test]
    fn test_ordinals_are_right_justified() {
        let keys: Vec<String> = (1..=11).map(|i| format!("host{:02}", i)).collect();
        let menu = Menu::from_keys(keys);

        let rendered = render_menu(&menu, None, 4);
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], " 1 : host01    2 : host02    3 : host03    4 : host04");
        assert_eq!(lines[2], " 9 : host09   10 : host10   11 : host11");
    }

    #[test]
    fn test_labels_come_from_table_rows() {
        let table = Table::parse(
            "server_groups.csv",
            "Label,Code\nManaged Services,ms\nOther Hosts,nonms\n",
            ',',
            2,
            false,
        )
        .unwrap();

        let rendered = render_menu(table.menu(), Some(&table), 1);
        assert!(rendered.starts_with("1 : Managed Services\n2 : Other Hosts\n"));
    }
}
