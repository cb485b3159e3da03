//! Activities scraped from the schedule table and the decision to book them.

use std::fmt;

use tracing::{info, warn};

use crate::{
    capacity::CapacityCounter,
    error::ParseError,
    schedule::TimeWindow,
    traits::{ControlCell, PageAutomation, RawRow},
};

/// Class types offered by the gym, named as the site spells them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClassTag {
    OpenBox,
    Crossfit,
    Weightlifting,
    Calisthenics,
}

impl ClassTag {
    pub const ALL: [ClassTag; 4] = [
        ClassTag::OpenBox,
        ClassTag::Crossfit,
        ClassTag::Weightlifting,
        ClassTag::Calisthenics,
    ];

    /// Name shown in the "Actividad" column.
    pub fn site_name(&self) -> &'static str {
        match self {
            ClassTag::OpenBox => "Open Box",
            ClassTag::Crossfit => "Crossfit",
            ClassTag::Weightlifting => "Halterofília",
            ClassTag::Calisthenics => "Calisteni",
        }
    }

    /// Exact match on the site name, ignoring surrounding whitespace.
    pub fn from_site_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|tag| tag.site_name() == name)
    }

    /// Resolve a class name written in the configuration. English names
    /// are accepted for the two classes the site labels in Spanish.
    pub fn from_config_name(name: &str) -> Option<Self> {
        match name.trim() {
            "Weightlifting" => Some(ClassTag::Weightlifting),
            "Calisthenics" => Some(ClassTag::Calisthenics),
            other => Self::from_site_name(other),
        }
    }

    /// Comma separated list of the site names, for error messages.
    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|tag| tag.site_name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ClassTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.site_name())
    }
}

/// Class of a scraped row. Names outside the known vocabulary are kept for
/// reporting but never booked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityClass {
    Registered(ClassTag),
    Unregistered(String),
}

impl ActivityClass {
    pub fn from_site_name(name: &str) -> Self {
        match ClassTag::from_site_name(name) {
            Some(tag) => ActivityClass::Registered(tag),
            None => ActivityClass::Unregistered(name.trim().to_string()),
        }
    }

    pub fn tag(&self) -> Option<ClassTag> {
        match self {
            ActivityClass::Registered(tag) => Some(*tag),
            ActivityClass::Unregistered(_) => None,
        }
    }
}

impl fmt::Display for ActivityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityClass::Registered(tag) => write!(f, "{tag}"),
            ActivityClass::Unregistered(name) => write!(f, "{name} (unregistered)"),
        }
    }
}

/// Opaque handle to a clickable reserve control, issued by the page
/// automation and handed back to it untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ControlRef(String);

impl ControlRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Result of trying to book one activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingOutcome {
    /// The reserve control was activated.
    Booked,
    /// The class is full; nothing was clicked.
    NoSpace,
    /// No reserve control in the row, usually because the user is already
    /// registered; nothing was clicked.
    NoControl,
    /// Both the click and the fallback click failed.
    BookFailed,
}

impl fmt::Display for BookingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BookingOutcome::Booked => "booked",
            BookingOutcome::NoSpace => "no space",
            BookingOutcome::NoControl => "no reserve control",
            BookingOutcome::BookFailed => "booking failed",
        };
        f.write_str(label)
    }
}

/// One activity of the displayed day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRecord {
    pub class: ActivityClass,
    pub window: TimeWindow,
    pub capacity: CapacityCounter,
    pub control: Option<ControlRef>,
}

impl ActivityRecord {
    pub fn new(
        class: ActivityClass,
        window: TimeWindow,
        capacity: CapacityCounter,
        control: Option<ControlRef>,
    ) -> Self {
        Self {
            class,
            window,
            capacity,
            control,
        }
    }

    /// Build a record from a scraped row.
    ///
    /// A link with a minus icon cancels an existing registration, so it is
    /// not kept as a reserve control.
    pub fn from_row(row: RawRow) -> Result<Self, ParseError> {
        let window = TimeWindow::parse(&row.schedule)?;
        let capacity = CapacityCounter::parse(&row.reservation)?;
        let class = ActivityClass::from_site_name(&row.class_name);
        let control = match row.control {
            ControlCell::Link {
                control,
                icon_class,
            } if icon_class.contains("plus") => Some(control),
            ControlCell::Link { .. } | ControlCell::Text(_) => None,
        };
        Ok(Self::new(class, window, capacity, control))
    }

    pub fn class_tag(&self) -> Option<ClassTag> {
        self.class.tag()
    }

    /// Try to book this activity through the page.
    ///
    /// Nothing is clicked when the class is full or the row has no reserve
    /// control. A failed click is retried once with the fallback mechanism.
    pub async fn attempt_book<P: PageAutomation>(&self, page: &mut P) -> BookingOutcome {
        if !self.capacity.has_space() {
            info!("No space at the moment: {}", self);
            return BookingOutcome::NoSpace;
        }
        let Some(control) = &self.control else {
            info!("No reserve control, already registered?: {}", self);
            return BookingOutcome::NoControl;
        };

        if let Err(e) = page.click(control).await {
            warn!("The button could not be clicked ({:#}), trying the fallback click", e);
            if let Err(e) = page.fallback_click(control).await {
                warn!("Could not book {}: {:#}", self, e);
                return BookingOutcome::BookFailed;
            }
        }

        info!("Class booked: {}", self);
        BookingOutcome::Booked
    }
}

impl fmt::Display for ActivityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.class, self.window, self.capacity)
    }
}
