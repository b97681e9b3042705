/// Items per page on the public browse listing.
pub const BROWSE_PAGE_SIZE: u64 = 12;

/// Approved donations shown on the landing page.
pub const FRONT_PAGE_DONATIONS: u64 = 6;

/// Urgent requests shown on the landing page.
pub const FRONT_PAGE_URGENT_REQUESTS: u64 = 3;

/// Related items shown beneath an item detail page.
pub const RELATED_ITEMS: u64 = 4;

/// Matches shown on the admin dashboard.
pub const ADMIN_RECENT_MATCHES: u64 = 10;

/// Notifications fetched for the notification list page.
pub const NOTIFICATION_PAGE_SIZE: u64 = 50;
