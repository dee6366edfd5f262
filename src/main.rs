mod auth;
mod completions;
mod config;
mod date;
mod due;
mod error;
mod habits;
mod model;
mod output;
mod progress;
mod schedule;
mod store;
mod streak;
mod today;

use crate::auth::{current_user, sign_in, sign_out, sign_up, PublicUser};
use crate::completions::{habit_history, mark_complete, skip};
use crate::config::{Config, DEFAULT_LOG_FILTER};
use crate::date::{fmt_date, parse_date};
use crate::error::CliError;
use crate::habits::{
    apply_changes, delete_habit, list_habits, make_habit, select_habit_index, short_id,
    HabitChanges, NewHabit, StatusFilter,
};
use crate::model::{new_id, Frequency, Habit};
use crate::output::{print_json, render_progress_bar, Styler, Table};
use crate::progress::{build_progress, schedule_label, DEFAULT_WINDOW_DAYS};
use crate::schedule::parse_week_days;
use crate::store::Store;
use crate::streak::{calculate_streak, longest_streak};
use crate::today::build_today;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Format {
    Table,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum FrequencyArg {
    Daily,
    Weekly,
}

impl From<FrequencyArg> for Frequency {
    fn from(f: FrequencyArg) -> Self {
        match f {
            FrequencyArg::Daily => Frequency::Daily,
            FrequencyArg::Weekly => Frequency::Weekly,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum FilterArg {
    All,
    Active,
    Paused,
}

impl From<FilterArg> for StatusFilter {
    fn from(f: FilterArg) -> Self {
        match f {
            FilterArg::All => StatusFilter::All,
            FilterArg::Active => StatusFilter::Active,
            FilterArg::Paused => StatusFilter::Paused,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "habit-tracker", version, about = "Track recurring habits, streaks and progress")]
struct Cli {
    /// Overrides the DB path for this invocation.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Overrides logical "today" (YYYY-MM-DD) for deterministic output/testing.
    #[arg(long, global = true)]
    today: Option<String>,

    #[arg(long, global = true, value_enum, default_value = "table")]
    format: Format,

    /// Disables ANSI color output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and sign in.
    Signup(SignupArgs),
    Signin(SigninArgs),
    Signout,
    Whoami,
    Add(AddArgs),
    Edit(EditArgs),
    List(ListArgs),
    Show(SelectorArgs),
    /// Stop a habit from showing up as due.
    Pause(SelectorArgs),
    Resume(SelectorArgs),
    /// Delete a habit and all of its completion records.
    Delete(SelectorArgs),
    /// Mark a habit done for a day (or not done, with --undo).
    Done(DoneArgs),
    Skip(SkipArgs),
    History(HistoryArgs),
    /// Habits due today with their state and streaks.
    Today,
    Progress(ProgressArgs),
}

#[derive(Args, Debug)]
struct SignupArgs {
    #[arg(long)]
    email: String,

    #[arg(long)]
    password: String,

    #[arg(long)]
    name: String,
}

#[derive(Args, Debug)]
struct SigninArgs {
    #[arg(long)]
    email: String,

    #[arg(long)]
    password: String,
}

#[derive(Args, Debug)]
struct AddArgs {
    /// At most 50 characters
    name: String,

    /// At most 200 characters
    #[arg(long)]
    description: Option<String>,

    /// Defaults to weekly when --days is given, daily otherwise.
    #[arg(long, value_enum)]
    frequency: Option<FrequencyArg>,

    /// One of: everyday, weekdays, weekends, sun,mon,...,sat
    #[arg(long)]
    days: Option<String>,

    /// HH:MM, 24-hour
    #[arg(long)]
    reminder_time: Option<String>,

    #[arg(long)]
    reminder_message: Option<String>,

    #[arg(long)]
    color: Option<String>,

    #[arg(long)]
    icon: Option<String>,
}

#[derive(Args, Debug)]
struct EditArgs {
    /// Habit selector: id, unique name prefix, or unique id prefix
    habit: String,

    #[arg(long)]
    name: Option<String>,

    /// Empty string clears it
    #[arg(long)]
    description: Option<String>,

    #[arg(long, value_enum)]
    frequency: Option<FrequencyArg>,

    #[arg(long)]
    days: Option<String>,

    /// Empty string clears it
    #[arg(long)]
    reminder_time: Option<String>,

    #[arg(long)]
    reminder_message: Option<String>,

    #[arg(long)]
    color: Option<String>,

    #[arg(long)]
    icon: Option<String>,
}

#[derive(Args, Debug)]
struct ListArgs {
    #[arg(long, value_enum, default_value = "all")]
    filter: FilterArg,

    /// Case-insensitive match on name or description
    #[arg(long)]
    search: Option<String>,
}

#[derive(Args, Debug)]
struct SelectorArgs {
    /// Habit selector: id, unique name prefix, or unique id prefix
    habit: String,
}

#[derive(Args, Debug)]
struct DoneArgs {
    habit: String,

    /// Defaults to today
    #[arg(long)]
    date: Option<String>,

    #[arg(long)]
    note: Option<String>,

    /// Record the day as not done
    #[arg(long)]
    undo: bool,
}

#[derive(Args, Debug)]
struct SkipArgs {
    habit: String,

    /// Defaults to today
    #[arg(long)]
    date: Option<String>,
}

#[derive(Args, Debug)]
struct HistoryArgs {
    habit: String,

    #[arg(long)]
    from: Option<String>,

    #[arg(long)]
    to: Option<String>,
}

#[derive(Args, Debug)]
struct ProgressArgs {
    /// Trailing window for completion rates, including today (at most 3660)
    #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS)]
    days: u32,
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let exit = match run(cli) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code()
        }
    };

    std::process::exit(exit);
}

fn init_tracing() {
    let filter = EnvFilter::try_new(config::log_filter())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Everything a command handler needs, built once from the global flags.
struct Ctx {
    store: Store,
    today: NaiveDate,
    now: DateTime<Utc>,
    format: Format,
    styler: Styler,
}

impl Ctx {
    fn json(&self) -> bool {
        self.format == Format::Json
    }

    fn date_or_today(&self, date: Option<&str>) -> Result<NaiveDate, CliError> {
        date.map_or(Ok(self.today), |d| parse_date(d, "date"))
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = Config::resolve(cli.db.as_deref(), cli.today.as_deref(), cli.no_color)?;
    let store = Store::new(config.db_path.clone());
    tracing::debug!(db = %store.path().display(), today = %config.today, "resolved config");

    let ctx = Ctx {
        store,
        today: config.today,
        now: Utc::now(),
        format: cli.format,
        styler: Styler::new(config.color),
    };

    match cli.command {
        Command::Signup(args) => cmd_signup(&ctx, args),
        Command::Signin(args) => cmd_signin(&ctx, args),
        Command::Signout => cmd_signout(&ctx),
        Command::Whoami => cmd_whoami(&ctx),
        Command::Add(args) => cmd_add(&ctx, args),
        Command::Edit(args) => cmd_edit(&ctx, args),
        Command::List(args) => cmd_list(&ctx, args),
        Command::Show(args) => cmd_show(&ctx, &args.habit),
        Command::Pause(args) => cmd_set_active(&ctx, &args.habit, false),
        Command::Resume(args) => cmd_set_active(&ctx, &args.habit, true),
        Command::Delete(args) => cmd_delete(&ctx, &args.habit),
        Command::Done(args) => cmd_done(&ctx, args),
        Command::Skip(args) => cmd_skip(&ctx, args),
        Command::History(args) => cmd_history(&ctx, args),
        Command::Today => cmd_today(&ctx),
        Command::Progress(args) => cmd_progress(&ctx, args),
    }
}

#[derive(serde::Serialize)]
struct UserOut {
    user: PublicUser,
}

fn print_user(ctx: &Ctx, verb: &str, user: PublicUser) -> Result<(), CliError> {
    if ctx.json() {
        return print_json(&UserOut { user });
    }
    println!("{} {} <{}>", verb, user.name, user.email);
    Ok(())
}

fn cmd_signup(ctx: &Ctx, args: SignupArgs) -> Result<(), CliError> {
    let user = ctx
        .store
        .update(|db| sign_up(db, &args.email, &args.password, &args.name, ctx.now))?;
    print_user(ctx, "Signed up as", PublicUser::from(&user))
}

fn cmd_signin(ctx: &Ctx, args: SigninArgs) -> Result<(), CliError> {
    let user = ctx
        .store
        .update(|db| sign_in(db, &args.email, &args.password, ctx.now))?;
    print_user(ctx, "Signed in as", PublicUser::from(&user))
}

fn cmd_signout(ctx: &Ctx) -> Result<(), CliError> {
    let user = ctx.store.update(sign_out)?;
    print_user(ctx, "Signed out", PublicUser::from(&user))
}

fn cmd_whoami(ctx: &Ctx) -> Result<(), CliError> {
    let db = ctx.store.read()?;
    let user = PublicUser::from(current_user(&db)?);
    print_user(ctx, "Signed in as", user)
}

fn parse_days_arg(days: Option<&str>) -> Result<Option<std::collections::BTreeSet<u8>>, CliError> {
    days.map(parse_week_days).transpose()
}

#[derive(serde::Serialize)]
struct HabitOut {
    habit: Habit,
}

fn cmd_add(ctx: &Ctx, args: AddArgs) -> Result<(), CliError> {
    let week_days = parse_days_arg(args.days.as_deref())?;
    let frequency = match args.frequency {
        Some(f) => Frequency::from(f),
        None if week_days.is_some() => Frequency::Weekly,
        None => Frequency::Daily,
    };

    let habit = ctx.store.update(|db| {
        let user_id = current_user(db)?.id.clone();
        let habit = make_habit(
            new_id(),
            &user_id,
            NewHabit {
                name: args.name,
                description: args.description,
                frequency,
                week_days,
                reminder_time: args.reminder_time,
                reminder_message: args.reminder_message,
                color: args.color,
                icon: args.icon,
            },
            ctx.now,
        )?;
        db.habits.push(habit.clone());
        tracing::info!(habit_id = %habit.id, "habit created");
        Ok(habit)
    })?;

    if ctx.json() {
        return print_json(&HabitOut { habit });
    }
    println!(
        "Added {} {} ({})",
        short_id(&habit.id),
        habit.name,
        schedule_label(&habit)
    );
    Ok(())
}

fn cmd_edit(ctx: &Ctx, args: EditArgs) -> Result<(), CliError> {
    let changes = HabitChanges {
        name: args.name,
        description: args.description,
        frequency: args.frequency.map(Frequency::from),
        week_days: parse_days_arg(args.days.as_deref())?,
        reminder_time: args.reminder_time,
        reminder_message: args.reminder_message,
        color: args.color,
        icon: args.icon,
    };
    if changes.is_empty() {
        return Err(CliError::usage("Nothing to change"));
    }

    let habit = ctx.store.update(|db| {
        let user_id = current_user(db)?.id.clone();
        let idx = select_habit_index(db, &user_id, &args.habit)?;
        apply_changes(&mut db.habits[idx], changes)?;
        Ok(db.habits[idx].clone())
    })?;

    if ctx.json() {
        return print_json(&HabitOut { habit });
    }
    println!("Updated {} {}", short_id(&habit.id), habit.name);
    Ok(())
}

fn status_label(habit: &Habit) -> &'static str {
    if habit.is_active {
        "active"
    } else {
        "paused"
    }
}

fn cmd_list(ctx: &Ctx, args: ListArgs) -> Result<(), CliError> {
    let db = ctx.store.read()?;
    let user = current_user(&db)?;
    let habits = list_habits(&db, &user.id, args.filter.into(), args.search.as_deref());

    if ctx.json() {
        #[derive(serde::Serialize)]
        struct Out {
            habits: Vec<Habit>,
        }
        return print_json(&Out { habits });
    }

    let mut table = Table::new(&["id", "habit", "schedule", "status", "created"]);
    for h in habits.iter() {
        table.push(vec![
            short_id(&h.id).to_string(),
            format!("{} {}", h.icon, h.name),
            schedule_label(h),
            status_label(h).to_string(),
            fmt_date(h.created_date()),
        ]);
    }
    if table.is_empty() {
        println!("{}", ctx.styler.gray("No habits found"));
    } else {
        println!("{}", table.render());
    }
    Ok(())
}

fn cmd_show(ctx: &Ctx, selector: &str) -> Result<(), CliError> {
    let db = ctx.store.read()?;
    let user = current_user(&db)?;
    let idx = select_habit_index(&db, &user.id, selector)?;
    let habit = db.habits[idx].clone();
    let history = habit_history(&db, &habit.id, &user.id, None, Some(ctx.today));
    let current = calculate_streak(&history, ctx.today);
    let longest = longest_streak(&history);

    if ctx.json() {
        #[derive(serde::Serialize)]
        struct Out {
            habit: Habit,
            current_streak: u32,
            longest_streak: u32,
        }
        return print_json(&Out {
            habit,
            current_streak: current,
            longest_streak: longest,
        });
    }

    let mut lines = vec![
        format!("{} {}", habit.icon, habit.name),
        format!("id:        {}", habit.id),
        format!("schedule:  {}", schedule_label(&habit)),
        format!("status:    {}", status_label(&habit)),
        format!("created:   {}", fmt_date(habit.created_date())),
        format!("streak:    {} (longest {})", current, longest),
    ];
    if let Some(d) = habit.description.as_deref() {
        lines.insert(1, format!("           {}", ctx.styler.gray(d)));
    }
    if let Some(t) = habit.reminder_time.as_deref() {
        let msg = habit.reminder_message.as_deref().unwrap_or("");
        lines.push(format!("reminder:  {} {}", t, msg).trim_end().to_string());
    }
    println!("{}", lines.join("\n"));
    Ok(())
}

fn cmd_set_active(ctx: &Ctx, selector: &str, active: bool) -> Result<(), CliError> {
    let habit = ctx.store.update(|db| {
        let user_id = current_user(db)?.id.clone();
        let idx = select_habit_index(db, &user_id, selector)?;
        db.habits[idx].is_active = active;
        Ok(db.habits[idx].clone())
    })?;

    if ctx.json() {
        return print_json(&HabitOut { habit });
    }
    let verb = if active { "Resumed" } else { "Paused" };
    println!("{} {}", verb, habit.name);
    Ok(())
}

fn cmd_delete(ctx: &Ctx, selector: &str) -> Result<(), CliError> {
    let (habit, removed) = ctx.store.update(|db| {
        let user_id = current_user(db)?.id.clone();
        let idx = select_habit_index(db, &user_id, selector)?;
        Ok(delete_habit(db, idx))
    })?;

    if ctx.json() {
        #[derive(serde::Serialize)]
        struct Out {
            deleted: Habit,
            completions_removed: usize,
        }
        return print_json(&Out {
            deleted: habit,
            completions_removed: removed,
        });
    }
    println!("Deleted {} ({} completions removed)", habit.name, removed);
    Ok(())
}

#[derive(serde::Serialize)]
struct CompletionOut {
    habit_id: String,
    completion: crate::model::HabitCompletion,
    streak: u32,
}

fn cmd_done(ctx: &Ctx, args: DoneArgs) -> Result<(), CliError> {
    let date = ctx.date_or_today(args.date.as_deref())?;
    let (habit, completion, streak) = ctx.store.update(|db| {
        let user_id = current_user(db)?.id.clone();
        let idx = select_habit_index(db, &user_id, &args.habit)?;
        let habit = db.habits[idx].clone();
        let rec = mark_complete(
            db,
            &habit.id,
            &user_id,
            date,
            !args.undo,
            args.note.as_deref(),
            ctx.now,
        );
        let history = habit_history(db, &habit.id, &user_id, None, Some(ctx.today));
        Ok((habit, rec, calculate_streak(&history, ctx.today)))
    })?;

    if ctx.json() {
        return print_json(&CompletionOut {
            habit_id: habit.id,
            completion,
            streak,
        });
    }
    let state = if completion.completed { "done" } else { "not done" };
    println!(
        "{} {} {} for {} (streak {})",
        ctx.styler.check_mark(completion.completed, false),
        habit.name,
        state,
        fmt_date(date),
        streak
    );
    Ok(())
}

fn cmd_skip(ctx: &Ctx, args: SkipArgs) -> Result<(), CliError> {
    let date = ctx.date_or_today(args.date.as_deref())?;
    let (habit, completion, streak) = ctx.store.update(|db| {
        let user_id = current_user(db)?.id.clone();
        let idx = select_habit_index(db, &user_id, &args.habit)?;
        let habit = db.habits[idx].clone();
        let rec = skip(db, &habit.id, &user_id, date);
        let history = habit_history(db, &habit.id, &user_id, None, Some(ctx.today));
        Ok((habit, rec, calculate_streak(&history, ctx.today)))
    })?;

    if ctx.json() {
        return print_json(&CompletionOut {
            habit_id: habit.id,
            completion,
            streak,
        });
    }
    println!(
        "{} {} skipped for {}",
        ctx.styler.check_mark(false, true),
        habit.name,
        fmt_date(date)
    );
    Ok(())
}

fn cmd_history(ctx: &Ctx, args: HistoryArgs) -> Result<(), CliError> {
    let from = args.from.as_deref().map(|d| parse_date(d, "from")).transpose()?;
    let to = args.to.as_deref().map(|d| parse_date(d, "to")).transpose()?;
    if let (Some(f), Some(t)) = (from, to) {
        if f > t {
            return Err(CliError::usage("Invalid range: from > to"));
        }
    }

    let db = ctx.store.read()?;
    let user = current_user(&db)?;
    let idx = select_habit_index(&db, &user.id, &args.habit)?;
    let habit = &db.habits[idx];
    let completions = habit_history(&db, &habit.id, &user.id, from, to);

    if ctx.json() {
        #[derive(serde::Serialize)]
        struct Out<'a> {
            habit_id: &'a str,
            completions: Vec<crate::model::HabitCompletion>,
        }
        return print_json(&Out {
            habit_id: &habit.id,
            completions,
        });
    }

    let mut table = Table::new(&["date", "", "note"]);
    for c in completions.iter() {
        table.push(vec![
            fmt_date(c.date),
            ctx.styler.check_mark(c.completed, c.skipped),
            c.note.clone().unwrap_or_default(),
        ]);
    }
    if table.is_empty() {
        println!("{}", ctx.styler.gray(&format!("No history for {}", habit.name)));
    } else {
        println!("{}", table.render());
    }
    Ok(())
}

fn cmd_today(ctx: &Ctx) -> Result<(), CliError> {
    let db = ctx.store.read()?;
    let user = current_user(&db)?;
    let out = build_today(&db, &user.id, ctx.today);

    if ctx.json() {
        return print_json(&out);
    }

    println!(
        "Today {}: {} of {} habits completed ({}%)",
        fmt_date(out.date),
        out.summary.completed,
        out.summary.total,
        out.summary.percent
    );
    println!("{}", render_progress_bar(out.summary.percent, 20));

    if out.habits.is_empty() {
        println!("{}", ctx.styler.gray("No habits for today"));
        return Ok(());
    }

    let mut table = Table::new(&["", "habit", "streak"]);
    for r in out.habits.iter() {
        table.push(vec![
            ctx.styler.check_mark(r.completed, r.skipped),
            format!("{} {}", r.icon, r.name),
            r.streak.to_string(),
        ]);
    }
    println!();
    println!("{}", table.render());
    Ok(())
}

fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(r) => format!("{}%", (r * 100.0).round() as u32),
        None => "-".to_string(),
    }
}

fn cmd_progress(ctx: &Ctx, args: ProgressArgs) -> Result<(), CliError> {
    let db = ctx.store.read()?;
    let user = current_user(&db)?;
    let out = build_progress(&db, &user.id, ctx.today, args.days)?;

    if ctx.json() {
        return print_json(&out);
    }

    println!("Active habits:  {} of {}", out.active_habits, out.total_habits);
    println!(
        "Today:          {} of {} ({}%)",
        out.today.completed, out.today.total, out.today.percent
    );
    println!("Best streak:    {} days", out.best_streak);
    println!(
        "Window:         {} .. {}",
        fmt_date(out.window.from),
        fmt_date(out.window.to)
    );

    if out.habits.is_empty() {
        return Ok(());
    }

    let mut table = Table::new(&["habit", "schedule", "streak", "longest", "rate"]);
    for r in out.habits.iter() {
        let name = if r.is_active {
            r.name.clone()
        } else {
            ctx.styler.gray(&format!("{} (paused)", r.name))
        };
        table.push(vec![
            name,
            r.schedule.clone(),
            r.current_streak.to_string(),
            r.longest_streak.to_string(),
            format_rate(r.success_rate.rate),
        ]);
    }
    println!();
    println!("{}", table.render());
    Ok(())
}
