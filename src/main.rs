use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, bail};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};

use petty_cash::domain::{Amount, TransactionKind};
use petty_cash::export;
use petty_cash::ledger::LedgerStore;
use petty_cash::reconciliation::{self, ReconciliationHistory, ReconciliationRecord};
use petty_cash::report::{self, Summary, TransactionFilter};
use petty_cash::settings::{Settings, Theme};
use petty_cash::storage::FileStore;

fn main() -> anyhow::Result<()> {
    let args = Arguments::parse();
    if let Some(log_level) = args.log_level {
        tracing_subscriber::fmt().with_max_level(log_level).init();
    }

    let store = FileStore::open(&args.data_dir)
        .with_context(|| format!("failed to open data directory {}", args.data_dir.display()))?;
    let mut ledger = LedgerStore::open(&store).context("failed to load the fund ledger")?;
    let mut history =
        ReconciliationHistory::open(&store).context("failed to load reconciliation history")?;
    let mut settings = Settings::load(&store).context("failed to load settings")?;

    let today = Local::now().date_naive();

    match args.command {
        Command::Init { amount, date } => {
            let date = business_date(date, today)?;
            require_positive(amount)?;
            if ledger.is_initialized() {
                bail!("the fund is already initialized; use `reset` to start over");
            }
            ledger.initialize(amount, date)?;
            println!("Fund initialized with {}", money(&settings, amount));
        }
        Command::Disburse {
            amount,
            date,
            purpose,
            recipient,
        } => {
            let date = business_date(date, today)?;
            require_positive(amount)?;
            if purpose.trim().is_empty() || recipient.trim().is_empty() {
                bail!("purpose and recipient are required");
            }
            if amount > ledger.balance() {
                bail!(
                    "insufficient funds: balance is {}",
                    money(&settings, ledger.balance())
                );
            }
            let state = ledger.disburse(amount, date, purpose.trim(), recipient.trim())?;
            println!(
                "Disbursed {}. Balance: {}",
                money(&settings, amount),
                money(&settings, state.balance())
            );
            warn_if_low(&settings, state.balance());
        }
        Command::Replenish { amount, date } => {
            let date = business_date(date, today)?;
            require_positive(amount)?;
            let state = ledger.replenish(amount, date)?;
            println!(
                "Replenished {}. Balance: {}",
                money(&settings, amount),
                money(&settings, state.balance())
            );
        }
        Command::Status => {
            if !ledger.is_initialized() {
                println!("Fund not initialized. Run `petty-cash init --amount <AMOUNT>`.");
                return Ok(());
            }
            println!("Balance:      {}", money(&settings, ledger.balance()));
            println!("Transactions: {}", ledger.transactions().len());
            if let Some(init) = ledger.state().initialization() {
                println!(
                    "Opened:       {} with {}",
                    init.date(),
                    money(&settings, init.amount())
                );
            }
            match history.latest() {
                Some(last) => println!("Last count:   {} ({})", last.date(), last.status()),
                None => println!("Last count:   never"),
            }
            warn_if_low(&settings, ledger.balance());
        }
        Command::History { filter, limit } => {
            let filter = filter.into_filter();
            let mut selected = filter.apply(ledger.transactions());
            report::sort_recent_first(&mut selected);
            for tx in selected.iter().take(limit.unwrap_or(usize::MAX)) {
                println!(
                    "{}  {:<14} {:>12}  {}  {}",
                    tx.date(),
                    tx.kind(),
                    money(&settings, tx.amount()),
                    tx.purpose().unwrap_or("-"),
                    tx.recipient().unwrap_or("-"),
                );
            }
        }
        Command::Reconcile {
            physical,
            notes,
            dry_run,
        } => {
            if !ledger.is_initialized() {
                bail!("nothing to reconcile: the fund is not initialized");
            }
            if physical.is_negative() {
                bail!("physical count cannot be negative");
            }
            let record = reconciliation::reconcile_on(today, ledger.balance(), physical, notes)?;
            print_reconciliation(&settings, &record);
            if !dry_run {
                history.record(record)?;
            }
        }
        Command::Reconciliations { limit } => {
            for record in history.recent(limit) {
                print_reconciliation(&settings, record);
            }
        }
        Command::Report { from, to } => {
            let filter = TransactionFilter {
                from,
                to,
                ..Default::default()
            };
            let summary = Summary::of(filter.apply(ledger.transactions()));
            println!(
                "Disbursed:   {} ({} entries)",
                money(&settings, summary.total_disbursed),
                summary.disbursement_count
            );
            println!(
                "Replenished: {} ({} entries)",
                money(&settings, summary.total_replenished),
                summary.replenishment_count
            );
            println!("Net change:  {}", money(&settings, summary.net_change()));
            for (purpose, total) in &summary.by_purpose {
                println!("  {purpose:<24} {}", money(&settings, *total));
            }
        }
        Command::ExportCsv { filter, output } => {
            let filter = filter.into_filter();
            let mut selected = filter.apply(ledger.transactions());
            report::sort_recent_first(&mut selected);
            export::write_transactions(selected, open_output(output.as_ref())?)?;
        }
        Command::ExportJson { output } => {
            let bundle = export::export_bundle(&ledger, &history, &settings)?;
            let mut writer = open_output(output.as_ref())?;
            serde_json::to_writer_pretty(&mut writer, &bundle)?;
            writeln!(writer)?;
        }
        Command::Import { input } => {
            let raw = std::fs::read_to_string(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let summary = export::import_bundle(&raw, &mut ledger, &mut history)?;
            println!(
                "Imported {} transactions and {} reconciliations{}",
                summary.transactions,
                summary.reconciliations,
                if summary.settings_replaced { " with settings" } else { "" }
            );
        }
        Command::Reset { yes } => {
            if !yes {
                bail!("reset deletes every transaction and reconciliation; pass --yes to confirm");
            }
            ledger.reset()?;
            println!("All fund data cleared.");
        }
        Command::Categories { action } => {
            match action {
                Some(CategoryAction::Add { name }) => {
                    settings.add_category(&name)?;
                    settings.save(&store)?;
                }
                Some(CategoryAction::Remove { name }) => {
                    settings.remove_category(&name)?;
                    settings.save(&store)?;
                }
                None => {}
            }
            for category in &settings.custom_categories {
                println!("{category}");
            }
        }
        Command::Settings {
            threshold,
            theme,
            currency_symbol,
            low_balance_alerts,
        } => {
            if let Some(threshold) = threshold {
                if threshold.is_negative() {
                    bail!("threshold cannot be negative");
                }
                settings.low_balance_threshold = threshold;
            }
            if let Some(theme) = theme {
                settings.appearance.theme = theme;
            }
            if let Some(symbol) = currency_symbol {
                settings.appearance.currency_symbol = symbol;
            }
            if let Some(enabled) = low_balance_alerts {
                settings.notifications.low_balance_alerts = enabled;
            }
            settings.save(&store)?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "petty-cash", version, about = "Petty-cash fund bookkeeping")]
struct Arguments {
    /// Directory holding the persisted fund data.
    #[arg(long, default_value = "petty-cash-data")]
    data_dir: PathBuf,
    #[arg(long)]
    log_level: Option<tracing::Level>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open the fund with its starting cash.
    Init {
        #[arg(long)]
        amount: Amount,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Pay cash out of the fund.
    Disburse {
        #[arg(long)]
        amount: Amount,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        purpose: String,
        #[arg(long)]
        recipient: String,
    },
    /// Top the fund back up.
    Replenish {
        #[arg(long)]
        amount: Amount,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Status,
    History {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Compare the recorded balance with a physical cash count.
    Reconcile {
        #[arg(long)]
        physical: Amount,
        #[arg(long)]
        notes: Option<String>,
        /// Show the result without saving it to the history.
        #[arg(long)]
        dry_run: bool,
    },
    Reconciliations {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    Report {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    ExportCsv {
        #[command(flatten)]
        filter: FilterArgs,
        /// Output file (stdout when omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    ExportJson {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace all fund data with a JSON export.
    Import { input: PathBuf },
    Reset {
        #[arg(long)]
        yes: bool,
    },
    Categories {
        #[command(subcommand)]
        action: Option<CategoryAction>,
    },
    Settings {
        #[arg(long)]
        threshold: Option<Amount>,
        #[arg(long, value_enum)]
        theme: Option<Theme>,
        #[arg(long)]
        currency_symbol: Option<String>,
        #[arg(long)]
        low_balance_alerts: Option<bool>,
    },
}

#[derive(Subcommand)]
enum CategoryAction {
    Add { name: String },
    Remove { name: String },
}

#[derive(Args)]
struct FilterArgs {
    #[arg(long = "type")]
    kind: Option<TransactionKind>,
    #[arg(long)]
    from: Option<NaiveDate>,
    #[arg(long)]
    to: Option<NaiveDate>,
    #[arg(long)]
    search: Option<String>,
}

impl FilterArgs {
    fn into_filter(self) -> TransactionFilter {
        TransactionFilter {
            kind: self.kind,
            from: self.from,
            to: self.to,
            search: self.search,
        }
    }
}

fn business_date(date: Option<NaiveDate>, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let date = date.unwrap_or(today);
    if date > today {
        bail!("date {date} is in the future");
    }
    Ok(date)
}

fn require_positive(amount: Amount) -> anyhow::Result<()> {
    if !amount.is_positive() {
        bail!("amount must be greater than zero");
    }
    Ok(())
}

fn money(settings: &Settings, amount: Amount) -> String {
    let symbol = &settings.appearance.currency_symbol;
    if amount.is_negative() {
        format!("-{symbol}{}", amount.abs())
    } else {
        format!("{symbol}{amount}")
    }
}

fn warn_if_low(settings: &Settings, balance: Amount) {
    if settings.is_low_balance(balance) {
        println!(
            "Warning: balance is at or below the {} threshold; consider replenishing.",
            money(settings, settings.low_balance_threshold)
        );
    }
}

fn print_reconciliation(settings: &Settings, record: &ReconciliationRecord) {
    println!(
        "{}  recorded {}  counted {}  difference {}  {}{}",
        record.date(),
        money(settings, record.system_balance()),
        money(settings, record.physical_balance()),
        money(settings, record.difference()),
        record.status(),
        record
            .notes()
            .map(|n| format!("  ({n})"))
            .unwrap_or_default(),
    );
}

fn open_output(path: Option<&PathBuf>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout()),
    })
}
