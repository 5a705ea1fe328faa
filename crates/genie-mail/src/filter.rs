use chrono::{DateTime, Duration, Utc};
use genie_core::{Category, Email, MailStatus, UnknownVariant};
use std::fmt;
use std::str::FromStr;

/// Folder-like partition of the mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    All,
    Inbox,
    Starred,
    Archive,
    Trash,
    Unread,
    /// No sent mail is loaded, so this view is always empty.
    Sent,
    Category(Category),
}

impl View {
    pub fn matches(self, email: &Email) -> bool {
        match self {
            View::All => true,
            View::Inbox => email.status == MailStatus::Inbox,
            View::Starred => email.is_starred,
            View::Archive => email.status == MailStatus::Archived,
            View::Trash => email.status == MailStatus::Trashed,
            View::Unread => !email.is_read,
            View::Sent => false,
            View::Category(category) => email.category == category,
        }
    }
}

impl Default for View {
    fn default() -> Self {
        Self::Inbox
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::All => f.write_str("all"),
            View::Inbox => f.write_str("inbox"),
            View::Starred => f.write_str("starred"),
            View::Archive => f.write_str("archive"),
            View::Trash => f.write_str("trash"),
            View::Unread => f.write_str("unread"),
            View::Sent => f.write_str("sent"),
            View::Category(category) => write!(f, "{category}"),
        }
    }
}

impl FromStr for View {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(View::All),
            "inbox" => Ok(View::Inbox),
            "starred" => Ok(View::Starred),
            "archive" | "archived" => Ok(View::Archive),
            "trash" | "trashed" => Ok(View::Trash),
            "unread" => Ok(View::Unread),
            "sent" => Ok(View::Sent),
            _ => value
                .parse::<Category>()
                .map(View::Category)
                .map_err(|_| UnknownVariant {
                    kind: "view",
                    value: value.to_string(),
                }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateRange {
    #[default]
    AllTime,
    LastDays(u32),
}

impl DateRange {
    pub fn from_days(days: Option<u32>) -> Self {
        days.map_or(DateRange::AllTime, DateRange::LastDays)
    }

    /// Emails whose date did not parse only ever match `AllTime`.
    pub fn matches(self, email: &Email, now: DateTime<Utc>) -> bool {
        match self {
            DateRange::AllTime => true,
            DateRange::LastDays(days) => email
                .date
                .timestamp()
                .is_some_and(|sent| now - sent <= Duration::days(i64::from(days))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailFilter {
    pub view: View,
    pub search: String,
    pub date_range: DateRange,
}

impl MailFilter {
    pub fn new(view: View) -> Self {
        Self {
            view,
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_date_range(mut self, date_range: DateRange) -> Self {
        self.date_range = date_range;
        self
    }

    pub fn matches(&self, email: &Email, now: DateTime<Utc>) -> bool {
        self.view.matches(email)
            && matches_search(email, &self.search.trim().to_lowercase())
            && self.date_range.matches(email, now)
    }
}

fn matches_search(email: &Email, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    [
        email.sender.as_str(),
        email.subject.as_str(),
        email.snippet.as_str(),
        email.content_or_empty(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

/// Emails matching `filter`, in collection order.
pub fn filter_emails<'a>(
    emails: &'a [Email],
    filter: &MailFilter,
    now: DateTime<Utc>,
) -> Vec<&'a Email> {
    emails
        .iter()
        .filter(|email| filter.matches(email, now))
        .collect()
}

/// Sidebar badges. Trashed mail is not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderCounts {
    pub unread: usize,
    pub starred: usize,
}

impl FolderCounts {
    pub fn of(emails: &[Email]) -> Self {
        emails
            .iter()
            .filter(|email| email.status != MailStatus::Trashed)
            .fold(Self::default(), |mut counts, email| {
                counts.unread += usize::from(!email.is_read);
                counts.starred += usize::from(email.is_starred);
                counts
            })
    }
}

/// Per-category totals in [`Category::ALL`] order.
pub fn category_counts(emails: &[Email]) -> Vec<(Category, usize)> {
    Category::ALL
        .into_iter()
        .map(|category| {
            let count = emails
                .iter()
                .filter(|email| email.category == category)
                .count();
            (category, count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use genie_core::EmailDate;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn email(id: &str, status: MailStatus, category: Category) -> Email {
        Email {
            id: id.to_string(),
            sender: "Sarah Chen".to_string(),
            subject: format!("Subject {id}"),
            snippet: "Quick note".to_string(),
            content: None,
            category,
            status,
            is_starred: false,
            date: EmailDate::from_datetime(now() - Duration::hours(2)),
            is_read: false,
            ai_summary: None,
        }
    }

    fn ids(emails: Vec<&Email>) -> Vec<&str> {
        emails.into_iter().map(|email| email.id.as_str()).collect()
    }

    #[test]
    fn archive_view_selects_archived_only() {
        let emails = vec![
            email("1", MailStatus::Inbox, Category::Urgent),
            email("2", MailStatus::Archived, Category::Task),
        ];
        let result = filter_emails(&emails, &MailFilter::new(View::Archive), now());
        assert_eq!(ids(result), vec!["2"]);
    }

    #[test]
    fn category_view_includes_matching_email() {
        let emails = vec![
            email("1", MailStatus::Inbox, Category::Urgent),
            email("2", MailStatus::Inbox, Category::Promotion),
            email("3", MailStatus::Archived, Category::Promotion),
        ];
        let view: View = "promotion".parse().expect("category view");
        let result = filter_emails(&emails, &MailFilter::new(view), now());
        assert_eq!(ids(result), vec!["2", "3"]);
    }

    #[test]
    fn trash_and_inbox_views_are_disjoint() {
        let emails = vec![
            email("1", MailStatus::Inbox, Category::General),
            email("2", MailStatus::Trashed, Category::General),
            email("3", MailStatus::Archived, Category::General),
            email("4", MailStatus::Inbox, Category::Task),
        ];
        let inbox = ids(filter_emails(&emails, &MailFilter::new(View::Inbox), now()));
        let trash = ids(filter_emails(&emails, &MailFilter::new(View::Trash), now()));
        assert_eq!(inbox, vec!["1", "4"]);
        assert_eq!(trash, vec!["2"]);
        assert!(inbox.iter().all(|id| !trash.contains(id)));
    }

    #[test]
    fn starred_view_ignores_status() {
        let mut archived = email("1", MailStatus::Archived, Category::General);
        archived.is_starred = true;
        let emails = vec![archived, email("2", MailStatus::Inbox, Category::General)];
        let result = filter_emails(&emails, &MailFilter::new(View::Starred), now());
        assert_eq!(ids(result), vec!["1"]);
    }

    #[test]
    fn sent_view_is_always_empty() {
        let emails = vec![email("1", MailStatus::Inbox, Category::General)];
        assert!(filter_emails(&emails, &MailFilter::new(View::Sent), now()).is_empty());
    }

    #[test]
    fn empty_search_preserves_order() {
        let emails = vec![
            email("3", MailStatus::Inbox, Category::General),
            email("1", MailStatus::Inbox, Category::General),
            email("2", MailStatus::Inbox, Category::General),
        ];
        let filter = MailFilter::new(View::All).with_search("   ");
        assert_eq!(ids(filter_emails(&emails, &filter, now())), vec!["3", "1", "2"]);
    }

    #[test]
    fn unmatched_search_is_empty() {
        let emails = vec![email("1", MailStatus::Inbox, Category::General)];
        let filter = MailFilter::new(View::All).with_search("zzz-nothing");
        assert!(filter_emails(&emails, &filter, now()).is_empty());
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let mut with_content = email("1", MailStatus::Inbox, Category::General);
        with_content.content = Some("The Quarterly Budget is attached".to_string());
        let emails = vec![with_content, email("2", MailStatus::Inbox, Category::General)];

        let by_content = MailFilter::new(View::All).with_search("quarterly budget");
        assert_eq!(ids(filter_emails(&emails, &by_content, now())), vec!["1"]);

        let by_sender = MailFilter::new(View::All).with_search("SARAH");
        assert_eq!(ids(filter_emails(&emails, &by_sender, now())), vec!["1", "2"]);
    }

    #[test]
    fn missing_content_is_searched_as_empty() {
        let emails = vec![email("1", MailStatus::Inbox, Category::General)];
        let filter = MailFilter::new(View::All).with_search("quick");
        assert_eq!(ids(filter_emails(&emails, &filter, now())), vec!["1"]);
    }

    #[test]
    fn last_days_excludes_older_mail() {
        let mut old = email("old", MailStatus::Inbox, Category::General);
        old.date = EmailDate::from_datetime(now() - Duration::days(10));
        let mut recent = email("recent", MailStatus::Inbox, Category::General);
        recent.date = EmailDate::from_datetime(now() - Duration::days(1));
        let emails = vec![old, recent];

        let filter = MailFilter::new(View::All).with_date_range(DateRange::LastDays(3));
        assert_eq!(ids(filter_emails(&emails, &filter, now())), vec!["recent"]);
    }

    #[test]
    fn unparsable_dates_only_match_all_time() {
        let mut undated = email("1", MailStatus::Inbox, Category::General);
        undated.date = EmailDate::parse("sometime last week");
        let emails = vec![undated];

        let bounded = MailFilter::new(View::All).with_date_range(DateRange::LastDays(3650));
        assert!(filter_emails(&emails, &bounded, now()).is_empty());

        let unbounded = MailFilter::new(View::All).with_date_range(DateRange::from_days(None));
        assert_eq!(filter_emails(&emails, &unbounded, now()).len(), 1);
    }

    #[test]
    fn filtering_twice_gives_same_result() {
        let mut starred = email("2", MailStatus::Archived, Category::Urgent);
        starred.is_starred = true;
        let emails = vec![
            email("1", MailStatus::Inbox, Category::Urgent),
            starred,
            email("3", MailStatus::Trashed, Category::General),
        ];
        let source = emails.clone();
        let filter = MailFilter::new(View::Category(Category::Urgent))
            .with_search("subject")
            .with_date_range(DateRange::LastDays(7));

        let first: Vec<Email> = filter_emails(&emails, &filter, now())
            .into_iter()
            .cloned()
            .collect();
        let second: Vec<Email> = filter_emails(&emails, &filter, now())
            .into_iter()
            .cloned()
            .collect();
        assert_eq!(first, second);
        assert_eq!(ids(first.iter().collect()), vec!["1", "2"]);
        assert_eq!(emails, source);
    }

    #[test]
    fn predicates_are_combined() {
        let mut match_all = email("1", MailStatus::Inbox, Category::General);
        match_all.subject = "Team lunch".to_string();
        let mut wrong_view = email("2", MailStatus::Archived, Category::General);
        wrong_view.subject = "Team lunch".to_string();
        let emails = vec![match_all, wrong_view, email("3", MailStatus::Inbox, Category::General)];

        let filter = MailFilter::new(View::Inbox)
            .with_search("lunch")
            .with_date_range(DateRange::LastDays(1));
        assert_eq!(ids(filter_emails(&emails, &filter, now())), vec!["1"]);
    }

    #[test]
    fn parses_views() {
        assert_eq!("Archived".parse::<View>().expect("view"), View::Archive);
        assert_eq!(" unread ".parse::<View>().expect("view"), View::Unread);
        assert_eq!(
            "URGENT".parse::<View>().expect("view"),
            View::Category(Category::Urgent)
        );
        assert!("spam".parse::<View>().is_err());
    }

    #[test]
    fn counts_skip_trashed_mail() {
        let mut starred = email("1", MailStatus::Archived, Category::Task);
        starred.is_starred = true;
        starred.is_read = true;
        let mut trashed = email("2", MailStatus::Trashed, Category::Task);
        trashed.is_starred = true;
        let emails = vec![starred, trashed, email("3", MailStatus::Inbox, Category::Urgent)];

        assert_eq!(
            FolderCounts::of(&emails),
            FolderCounts {
                unread: 1,
                starred: 1
            }
        );
        assert_eq!(
            category_counts(&emails),
            vec![
                (Category::Urgent, 1),
                (Category::Task, 2),
                (Category::Important, 0),
                (Category::Promotion, 0),
                (Category::General, 0),
            ]
        );
    }
}
