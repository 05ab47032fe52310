//! Terminal rendering of the user table and pagination controls.
//!
//! Rows are view-models derived from `UserRecord`; nothing here mutates the
//! store.

use crate::user::UserRecord;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Sections of the settings page; `Users` is the one this tool manages
pub const MENU: [&str; 5] = ["General", "Users", "Plan", "Billing", "Integrations"];
const ACTIVE_MENU: usize = 1;

/// One table row as displayed
#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub status: &'static str,
    pub role: String,
    pub last_login_date: String,
    pub last_login_time: String,
    last_login: Option<DateTime<Utc>>,
}

impl From<&UserRecord> for UserRow {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            status: status_label(user.status),
            role: user.role.clone(),
            last_login_date: format_date(user.last_login),
            last_login_time: format_time(user.last_login),
            last_login: user.last_login,
        }
    }
}

pub fn status_label(active: bool) -> &'static str {
    if active {
        "Active"
    } else {
        "Invited"
    }
}

/// e.g. `Jan 5, 2023`
pub fn format_date(ts: Option<DateTime<Utc>>) -> String {
    ts.map_or_else(|| "-".to_string(), |t| t.format("%b %-d, %Y").to_string())
}

/// e.g. `3:04 PM`
pub fn format_time(ts: Option<DateTime<Utc>>) -> String {
    ts.map_or_else(|| "-".to_string(), |t| t.format("%-I:%M %p").to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Name,
    Status,
    Role,
    LastLogin,
}

impl SortColumn {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "name" => Some(Self::Name),
            "status" => Some(Self::Status),
            "role" => Some(Self::Role),
            "last-login" | "lastlogin" | "last_login" | "login" => Some(Self::LastLogin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Status => "status",
            Self::Role => "role",
            Self::LastLogin => "last-login",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// Active column sort, applied to the rows of the displayed page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub column: SortColumn,
    pub order: SortOrder,
}

impl Sort {
    fn compare(&self, a: &UserRow, b: &UserRow) -> Ordering {
        let ord = match self.column {
            SortColumn::Name => a.name.cmp(&b.name),
            SortColumn::Status => a.status.cmp(b.status),
            SortColumn::Role => a.role.cmp(&b.role),
            SortColumn::LastLogin => a.last_login.cmp(&b.last_login),
        };
        match self.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }
}

/// Build display rows for a page, sorted if a sort is active
pub fn rows_for(users: &[UserRecord], sort: Option<Sort>) -> Vec<UserRow> {
    let mut rows: Vec<UserRow> = users.iter().map(UserRow::from).collect();
    if let Some(sort) = sort {
        rows.sort_by(|a, b| sort.compare(a, b));
    }
    rows
}

/// Current-page state behind the Previous / Next controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page: usize,
    page_size: usize,
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self, page_count: usize) -> bool {
        self.page < page_count
    }

    pub fn prev(&mut self) -> bool {
        if self.has_prev() {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    pub fn next(&mut self, page_count: usize) -> bool {
        if self.has_next(page_count) {
            self.page += 1;
            true
        } else {
            false
        }
    }

    /// Jump to `page` if it exists
    pub fn goto(&mut self, page: usize, page_count: usize) -> bool {
        if (1..=page_count).contains(&page) {
            self.page = page;
            true
        } else {
            false
        }
    }

    /// Pull the page back in range after the store shrank
    pub fn clamp(&mut self, page_count: usize) {
        if self.page > page_count {
            self.page = page_count.max(1);
        }
    }
}

/// `Users` header line, e.g. `Users  (25 users)`
pub fn header_summary(count: usize) -> String {
    format!("Users  ({} users)", count)
}

pub fn render_menu() -> String {
    MENU.iter()
        .enumerate()
        .map(|(i, item)| {
            if i == ACTIVE_MENU {
                format!("[{}]", item)
            } else {
                item.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Plain-text table of rows with aligned columns
pub fn render_table(rows: &[UserRow], sort: Option<Sort>) -> String {
    let arrow = |col: SortColumn| match sort {
        Some(s) if s.column == col => match s.order {
            SortOrder::Asc => " ^",
            SortOrder::Desc => " v",
        },
        _ => "",
    };
    let headers = [
        "ID".to_string(),
        format!("Name{}", arrow(SortColumn::Name)),
        "Email".to_string(),
        format!("Status{}", arrow(SortColumn::Status)),
        format!("Role{}", arrow(SortColumn::Role)),
        format!("Last Login{}", arrow(SortColumn::LastLogin)),
    ];
    let body: Vec<[String; 6]> = rows
        .iter()
        .map(|r| {
            [
                r.id.to_string(),
                r.name.clone(),
                r.email.clone(),
                r.status.to_string(),
                r.role.clone(),
                format!("{} {}", r.last_login_date, r.last_login_time),
            ]
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for cells in &body {
        for (w, c) in widths.iter_mut().zip(cells.iter()) {
            *w = (*w).max(c.chars().count());
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(widths.iter())
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(&headers)];
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    if body.is_empty() {
        out.push("(no users)".to_string());
    }
    for cells in &body {
        out.push(line(cells));
    }
    out.join("\n")
}

/// Pagination line, e.g. `< Previous   1 [2] 3   Next >`
pub fn render_pager(pager: &Pager, page_count: usize) -> String {
    let prev = if pager.has_prev() { "< Previous" } else { "  Previous" };
    let next = if pager.has_next(page_count) { "Next >" } else { "Next  " };
    let pages = (1..=page_count)
        .map(|n| {
            if n == pager.page() {
                format!("[{}]", n)
            } else {
                n.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!("{}   {}   {}", prev, pages, next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn user(id: u64, name: &str, status: bool, login_day: Option<u32>) -> UserRecord {
        UserRecord {
            id,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            role: "Member".to_string(),
            status,
            avatar: String::new(),
            last_login: login_day.map(|d| Utc.with_ymd_and_hms(2023, 1, d, 15, 4, 0).unwrap()),
        }
    }

    #[test]
    fn test_row_mapping() {
        let row = UserRow::from(&user(3, "Ada", true, Some(5)));
        assert_eq!(row.status, "Active");
        assert_eq!(row.last_login_date, "Jan 5, 2023");
        assert_eq!(row.last_login_time, "3:04 PM");

        let row = UserRow::from(&user(4, "Bob", false, None));
        assert_eq!(row.status, "Invited");
        assert_eq!(row.last_login_date, "-");
    }

    #[test]
    fn test_sort_by_name_desc() {
        let users = vec![user(1, "b", true, None), user(2, "c", true, None), user(3, "a", true, None)];
        let sort = Sort {
            column: SortColumn::Name,
            order: SortOrder::Desc,
        };
        let names: Vec<String> = rows_for(&users, Some(sort)).into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["c", "b", "a"]);

        let unsorted: Vec<u64> = rows_for(&users, None).iter().map(|r| r.id).collect();
        assert_eq!(unsorted, vec![1, 2, 3]);
    }

    #[test]
    fn test_sort_by_last_login_missing_first() {
        let users = vec![user(1, "a", true, Some(9)), user(2, "b", true, None), user(3, "c", true, Some(2))];
        let sort = Sort {
            column: SortColumn::LastLogin,
            order: SortOrder::Asc,
        };
        let ids: Vec<u64> = rows_for(&users, Some(sort)).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_sort_is_stable() {
        let users = vec![user(1, "a", true, None), user(2, "b", false, None), user(3, "c", true, None)];
        let sort = Sort {
            column: SortColumn::Status,
            order: SortOrder::Asc,
        };
        let ids: Vec<u64> = rows_for(&users, Some(sort)).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }

    #[test]
    fn test_sort_column_parse() {
        assert_eq!(SortColumn::from_str("Last-Login"), Some(SortColumn::LastLogin));
        assert_eq!(SortColumn::from_str("email"), None);
        assert_eq!(SortOrder::from_str("DESC"), Some(SortOrder::Desc));
    }

    #[test]
    fn test_pager_transitions() {
        let mut pager = Pager::new(10);
        assert!(!pager.has_prev());
        assert!(!pager.prev());
        assert!(pager.next(3));
        assert!(pager.next(3));
        assert!(!pager.next(3));
        assert_eq!(pager.page(), 3);
        assert!(!pager.goto(4, 3));
        assert!(!pager.goto(0, 3));
        assert!(pager.goto(1, 3));
        assert_eq!(pager.page(), 1);
    }

    #[test]
    fn test_pager_clamp() {
        let mut pager = Pager::new(10);
        pager.goto(3, 3);
        pager.clamp(2);
        assert_eq!(pager.page(), 2);
        pager.clamp(0);
        assert_eq!(pager.page(), 1);
        assert!(!pager.has_next(0));
    }

    #[test]
    fn test_pager_zero_size_coerced() {
        assert_eq!(Pager::new(0).page_size(), 1);
    }

    #[test]
    fn test_render_pager() {
        let mut pager = Pager::new(10);
        pager.goto(2, 3);
        assert_eq!(render_pager(&pager, 3), "< Previous   1 [2] 3   Next >");
        pager.goto(3, 3);
        assert!(render_pager(&pager, 3).ends_with("Next  "));
    }

    #[test]
    fn test_render_table() {
        let rows = rows_for(&[user(1, "Ada", true, Some(5))], None);
        let table = render_table(&rows, None);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ID  Name"));
        assert!(lines[2].contains("ada@example.com"));
        assert!(lines[2].contains("Jan 5, 2023 3:04 PM"));

        let empty = render_table(&[], None);
        assert!(empty.ends_with("(no users)"));
    }

    #[test]
    fn test_render_table_sort_arrow() {
        let sort = Sort {
            column: SortColumn::Role,
            order: SortOrder::Desc,
        };
        let table = render_table(&[], Some(sort));
        assert!(table.lines().next().unwrap().contains("Role v"));
    }

    #[test]
    fn test_header_and_menu() {
        assert_eq!(header_summary(1), "Users  (1 users)");
        assert_eq!(header_summary(0), "Users  (0 users)");
        assert_eq!(header_summary(25), "Users  (25 users)");
        assert_eq!(render_menu(), "General | [Users] | Plan | Billing | Integrations");
    }
}
