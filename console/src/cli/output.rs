//! Text rendering for command results

use colored::{ColoredString, Colorize};

use easytp::activity::filter::{ActivityType, UsageStatsFilter};
use easytp::apps::model::{App, AppStatus};
use easytp::apps::store::AppCounts;
use easytp::files::browser::decode_display_path;
use easytp::utils::format_file_size;
use easytp::workers::poller::PollEvent;
use openapi_client::models::{DashboardResponse, FilesResponse, UsageStatsResponse, User};

pub fn signed_in(user: &User) {
    println!(
        "{} {} ({})",
        "Signed in as".green(),
        user.username.bold(),
        user.role.as_str()
    );
}

pub fn user(user: &User) {
    println!("{} ({})", user.username.bold(), user.role.as_str());
    println!("  email: {}", user.email);
    if !user.apps_available.is_empty() {
        println!("  apps available: {}", user.apps_available);
    }
}

pub fn dashboard(dashboard: &DashboardResponse) {
    println!("{}", dashboard.user.username.bold());
    println!("  role: {}", dashboard.role);
    println!("  template: {}", dashboard.template_type);
    println!("  apps available: {}", dashboard.apps_available);
    if let Some(running) = dashboard.running_apps {
        println!("  running apps: {}", running);
    }
    if let Some(files) = dashboard.total_files {
        println!("  files: {}", files);
    }
    if let Some(used) = dashboard.storage_used {
        println!("  storage used: {:.2} MB", used);
    }
}

fn status(status: AppStatus) -> ColoredString {
    match status {
        AppStatus::Running => status.as_str().green(),
        AppStatus::Stopped => status.as_str().dimmed(),
        AppStatus::Starting | AppStatus::Stopping => status.as_str().yellow(),
        AppStatus::Error => status.as_str().red(),
    }
}

pub fn app_line(app: &App) {
    let readiness = if app.ready { "ready" } else { "not ready" };
    println!("{:<20} {:<10} {}", app.name.bold(), status(app.status), readiness);
    if let Some(stages) = app.stages {
        println!(
            "  deployment={:?} pod={:?} service={:?} ingress={:?}",
            stages.deployment, stages.pod, stages.service, stages.ingress
        );
    }
    if let Some(message) = &app.message {
        println!("  {}", message.dimmed());
    }
}

pub fn apps(apps: &[App], counts: AppCounts) {
    let mut apps = apps.to_vec();
    apps.sort_by(|a, b| a.name.cmp(&b.name));
    for app in &apps {
        app_line(app);
        if app.ready {
            if let Some(connection) = app.connection() {
                println!("  {}", connection.direct_url().underline());
            }
        }
    }
    println!(
        "{} running, {} stopped, {} transitioning, {} total",
        counts.running, counts.stopped, counts.transitioning, counts.total
    );
}

pub fn poll_event(event: &PollEvent) {
    match event {
        PollEvent::Fetched { apps, next_poll } => {
            let mut apps = apps.clone();
            apps.sort_by(|a, b| a.name.cmp(&b.name));
            println!("{}", format!("-- next poll in {:?}", next_poll).dimmed());
            for app in &apps {
                app_line(app);
            }
        }
        PollEvent::Warm { id, connection } => match connection {
            Some(connection) => println!(
                "{} {} {}",
                id.bold(),
                "ready:".green(),
                connection.direct_url().underline()
            ),
            None => println!("{} {}", id.bold(), "ready".green()),
        },
        PollEvent::Failed { message } => println!("{} {}", "fetch failed:".red(), message),
        PollEvent::SignedOut => println!("{}", "Session ended, sign in again".yellow()),
    }
}

pub fn listing(listing: &FilesResponse) {
    println!("{}", listing.current_path.bold());
    for dir in &listing.directories {
        println!("  {:<40} {:>10}  {}", format!("{}/", dir.name).blue(), "-", dir.path.dimmed());
    }
    for file in &listing.files {
        let size = file.size.map(format_file_size).unwrap_or_default();
        println!("  {:<40} {:>10}  {}", file.name, size, file.path.dimmed());
    }
    if let Some(parent) = &listing.parent_path_encoded {
        println!("  parent: {}", decode_display_path(parent).dimmed());
    }
    let usage = listing.storage_usage;
    println!(
        "{:.2} MB of {:.2} MB used ({:.1}%){}",
        usage.current_mb,
        usage.limit_mb,
        usage.percentage,
        if listing.is_readonly { ", read-only" } else { "" }
    );
}

pub fn activity(stats: &UsageStatsResponse, filter: &UsageStatsFilter) {
    let totals = stats.stats;
    println!(
        "{} total, {} today, {} this week, {} users",
        totals.total_activities, totals.today_activities, totals.week_activities, totals.unique_users
    );
    if filter.has_active_filters() {
        println!("{}", format!("{} filter(s) active", filter.active_filter_count()).dimmed());
    }
    for entry in &stats.activities {
        println!(
            "{}  {:<16} {:<18} {}",
            entry.timestamp.dimmed(),
            entry.display_user().bold(),
            ActivityType::label_for(&entry.activity_type),
            entry.ip_address.as_deref().unwrap_or("")
        );
    }
    let page = &stats.pagination;
    if page.num_pages > 1 {
        println!("Page {} of {}", page.current_page, page.num_pages);
    }
}
