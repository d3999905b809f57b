//! Interactive category / merchant assignment as an explicit state machine.
//!
//! The session owns a copy of the ledger and a queue of rows needing work,
//! largest absolute amount first. Assignments stay pending until the session
//! is finished; nothing in the ledger changes before that. The terminal
//! driver lives in the CLI; this module never touches stdin.

use std::collections::{BTreeMap, BTreeSet};

use tally_core::{RuleSet, Transaction, UNKNOWN_MERCHANT};

/// Which field the session fills in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignMode {
    Categories,
    Merchants,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 1-based index into the known-category list
    Pick(usize),
    New(String),
    /// Free-text value (merchant mode)
    Set(String),
    Auto,
    Skip,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    Presenting { pos: usize },
    AwaitingCommand { pos: usize },
    AwaitingConfirmation { pos: usize, suggestion: String },
    Applying { pos: usize, value: String },
    Skipping { pos: usize },
    Quitting,
    Finished,
}

/// What the driver should tell the user after an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Assigned(String),
    Created(String),
    Suggested(String),
    NoSuggestion,
    Declined,
    Skipped,
    Invalid(String),
    Quit,
    /// Input arrived while no prompt was open.
    Ignored,
}

pub fn parse_command(mode: AssignMode, input: &str) -> Result<Command, String> {
    let input = input.trim();
    let lower = input.to_lowercase();
    match lower.as_str() {
        "quit" => return Ok(Command::Quit),
        "skip" => return Ok(Command::Skip),
        "auto" => return Ok(Command::Auto),
        _ => {}
    }

    match mode {
        AssignMode::Categories => {
            if lower.starts_with("new:") {
                let name = input.get(4..).unwrap_or("").trim();
                if name.is_empty() {
                    return Err("Invalid category name".to_string());
                }
                return Ok(Command::New(name.to_string()));
            }
            input.parse::<usize>().map(Command::Pick).map_err(|_| {
                "Invalid input. Enter a number, 'new:CategoryName', 'skip', 'auto', or 'quit'".to_string()
            })
        }
        AssignMode::Merchants => {
            if input.is_empty() {
                Err("Please enter a merchant name".to_string())
            } else {
                Ok(Command::Set(input.to_string()))
            }
        }
    }
}

fn needs_work(mode: AssignMode, txn: &Transaction) -> bool {
    match mode {
        AssignMode::Categories => txn.is_uncategorized(),
        AssignMode::Merchants => txn.has_unknown_merchant(),
    }
}

/// Ledger indices needing work, largest |amount| first, then most recent.
pub fn work_queue(mode: AssignMode, ledger: &[Transaction]) -> Vec<usize> {
    let mut queue: Vec<usize> = (0..ledger.len())
        .filter(|&i| needs_work(mode, &ledger[i]))
        .collect();
    queue.sort_by(|&a, &b| {
        let (ta, tb) = (&ledger[a], &ledger[b]);
        tb.abs_amount()
            .cmp(&ta.abs_amount())
            .then(tb.transaction_date.cmp(&ta.transaction_date))
    });
    queue
}

/// Distinct non-empty categories in the ledger, plus `Other`, sorted.
pub fn known_categories(ledger: &[Transaction]) -> Vec<String> {
    let mut set: BTreeSet<String> = ledger
        .iter()
        .map(|t| t.category.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    set.insert("Other".to_string());
    set.into_iter().collect()
}

pub struct AssignSession<'r> {
    mode: AssignMode,
    rules: &'r RuleSet,
    ledger: Vec<Transaction>,
    queue: Vec<usize>,
    categories: Vec<String>,
    pending: BTreeMap<usize, String>,
    state: State,
}

impl<'r> AssignSession<'r> {
    pub fn new(mode: AssignMode, ledger: Vec<Transaction>, rules: &'r RuleSet) -> Self {
        let queue = work_queue(mode, &ledger);
        let categories = known_categories(&ledger);
        let state = if queue.is_empty() {
            State::Finished
        } else {
            State::Presenting { pos: 0 }
        };
        Self {
            mode,
            rules,
            ledger,
            queue,
            categories,
            pending: BTreeMap::new(),
            state,
        }
    }

    pub fn mode(&self) -> AssignMode {
        self.mode
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Quitting | State::Finished)
    }

    /// Position in the queue and the transaction under review.
    pub fn current(&self) -> Option<(usize, &Transaction)> {
        let pos = match &self.state {
            State::Presenting { pos }
            | State::AwaitingCommand { pos }
            | State::AwaitingConfirmation { pos, .. }
            | State::Applying { pos, .. }
            | State::Skipping { pos } => *pos,
            State::Quitting | State::Finished => return None,
        };
        self.queue.get(pos).map(|&i| (pos, &self.ledger[i]))
    }

    /// Show the current transaction: Presenting → AwaitingCommand.
    pub fn present(&mut self) -> Option<(usize, &Transaction)> {
        if let State::Presenting { pos } = self.state {
            self.state = State::AwaitingCommand { pos };
        }
        self.current()
    }

    /// Feed one line of user input.
    pub fn submit(&mut self, input: &str) -> Reply {
        let state = std::mem::replace(&mut self.state, State::Quitting);
        let (next, reply) = match state {
            State::AwaitingCommand { pos } => match parse_command(self.mode, input) {
                Ok(cmd) => self.on_command(pos, cmd),
                Err(msg) => (State::AwaitingCommand { pos }, Reply::Invalid(msg)),
            },
            State::AwaitingConfirmation { pos, suggestion } => {
                let answer = input.trim().to_lowercase();
                if answer == "y" || answer == "yes" {
                    self.remember_category(&suggestion);
                    (
                        State::Applying { pos, value: suggestion.clone() },
                        Reply::Assigned(suggestion),
                    )
                } else {
                    (State::AwaitingCommand { pos }, Reply::Declined)
                }
            }
            other => (other, Reply::Ignored),
        };
        self.state = next;
        self.settle();
        reply
    }

    fn on_command(&mut self, pos: usize, cmd: Command) -> (State, Reply) {
        match cmd {
            Command::Quit => (State::Quitting, Reply::Quit),
            Command::Skip => (State::Skipping { pos }, Reply::Skipped),
            Command::Auto => match self.suggest(pos) {
                Some(suggestion) => (
                    State::AwaitingConfirmation {
                        pos,
                        suggestion: suggestion.clone(),
                    },
                    Reply::Suggested(suggestion),
                ),
                None => (State::AwaitingCommand { pos }, Reply::NoSuggestion),
            },
            Command::Pick(n) => match n.checked_sub(1).and_then(|i| self.categories.get(i)) {
                Some(cat) => {
                    let cat = cat.clone();
                    (
                        State::Applying { pos, value: cat.clone() },
                        Reply::Assigned(cat),
                    )
                }
                None => (
                    State::AwaitingCommand { pos },
                    Reply::Invalid(format!(
                        "Please enter a number between 1 and {}",
                        self.categories.len()
                    )),
                ),
            },
            Command::New(name) => {
                self.remember_category(&name);
                (
                    State::Applying { pos, value: name.clone() },
                    Reply::Created(name),
                )
            }
            Command::Set(value) => (
                State::Applying { pos, value: value.clone() },
                Reply::Assigned(value),
            ),
        }
    }

    fn suggest(&self, pos: usize) -> Option<String> {
        let txn = &self.ledger[*self.queue.get(pos)?];
        match self.mode {
            AssignMode::Categories => self
                .rules
                .categories
                .suggest(&txn.description, &txn.merchant)
                .map(str::to_string),
            AssignMode::Merchants => self
                .rules
                .merchants
                .suggest_from_description(&txn.description)
                .filter(|m| m != UNKNOWN_MERCHANT),
        }
    }

    fn remember_category(&mut self, name: &str) {
        if self.mode == AssignMode::Categories && !self.categories.iter().any(|c| c == name) {
            self.categories.push(name.to_string());
            self.categories.sort();
        }
    }

    /// Run the transient states through to the next prompt.
    fn settle(&mut self) {
        loop {
            match std::mem::replace(&mut self.state, State::Quitting) {
                State::Applying { pos, value } => {
                    if let Some(&idx) = self.queue.get(pos) {
                        self.pending.insert(idx, value);
                    }
                    self.state = self.advance(pos);
                }
                State::Skipping { pos } => self.state = self.advance(pos),
                other => {
                    self.state = other;
                    return;
                }
            }
        }
    }

    fn advance(&self, pos: usize) -> State {
        if pos + 1 < self.queue.len() {
            State::Presenting { pos: pos + 1 }
        } else {
            State::Finished
        }
    }

    /// Apply every pending assignment and hand the ledger back.
    pub fn finish(self) -> Outcome {
        let mut ledger = self.ledger;
        let assigned = self.pending.len();
        for (idx, value) in self.pending {
            match self.mode {
                AssignMode::Categories => ledger[idx].category = value,
                AssignMode::Merchants => ledger[idx].merchant = value,
            }
        }
        Outcome { ledger, assigned }
    }
}

#[derive(Debug)]
pub struct Outcome {
    pub ledger: Vec<Transaction>,
    pub assigned: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub missing_categories: usize,
    pub missing_merchants: usize,
}

impl Stats {
    pub fn pct(&self, n: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            n as f64 / self.total as f64 * 100.0
        }
    }
}

pub fn stats(ledger: &[Transaction]) -> Stats {
    Stats {
        total: ledger.len(),
        missing_categories: ledger.iter().filter(|t| t.is_uncategorized()).count(),
        missing_merchants: ledger.iter().filter(|t| t.has_unknown_merchant()).count(),
    }
}
