//! The gym's client area, driven through a WebDriver session.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{Datelike, NaiveDate};
use tracing::{debug, info, warn};

use crate::{
    activity::ControlRef,
    config::{AppConfig, Credentials, SiteConfig, TimingConfig},
    traits::{ControlCell, PageAutomation, RawRow},
    webdriver::{ElementId, Locator, Session, WebDriverClient},
};

/// The first row names the day, the second the columns.
pub const HEADER_ROWS: usize = 2;

/// Horario, Actividad, Reservas, Reservar.
const ACTIVITY_CELLS: usize = 4;

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";
const SCRIPT_CLICK: &str = "arguments[0].click();";

/// Browser session on the booking site.
#[derive(Debug)]
pub struct CcbSite {
    session: Session,
    site: SiteConfig,
    timing: TimingConfig,
}

impl CcbSite {
    pub fn new(session: Session, site: SiteConfig, timing: TimingConfig) -> Self {
        Self {
            session,
            site,
            timing,
        }
    }

    /// Open a browser through the configured WebDriver endpoint.
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let client = WebDriverClient::new(config.webdriver.url.clone(), &config.network)?;
        let session = client.new_session(&config.webdriver).await?;
        if config.webdriver.maximize && !config.webdriver.headless {
            session.maximize_window().await?;
        }
        info!("Browser session started ({})", config.webdriver.browser);
        Ok(Self::new(session, config.site.clone(), config.timing.clone()))
    }

    /// Wait a moment, then end the session.
    pub async fn close(self) -> Result<()> {
        pause(self.timing.close_wait_secs).await;
        self.session.delete().await?;
        info!("Browser session closed");
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.session.execute_script(SCROLL_TO_BOTTOM, vec![]).await?;
        Ok(())
    }

    async fn read_row(&self, cells: &[ElementId]) -> Result<RawRow> {
        let schedule = self.session.element_text(&cells[0]).await?;
        let class_name = self.session.element_text(&cells[1]).await?;
        let reservation = self.session.element_text(&cells[2]).await?;
        let control = self.read_control_cell(&cells[3]).await?;
        Ok(RawRow::new(schedule, class_name, reservation, control))
    }

    async fn read_control_cell(&self, cell: &ElementId) -> Result<ControlCell> {
        let text = self.session.element_text(cell).await?;
        if !text.trim().is_empty() {
            return Ok(ControlCell::Text(text));
        }
        let link = self.session.find_element_in(cell, Locator::Css("a")).await?;
        let icon = self.session.find_element_in(cell, Locator::Css("span")).await?;
        let icon_class = self
            .session
            .element_attribute(&icon, "class")
            .await?
            .unwrap_or_default();
        Ok(ControlCell::Link {
            control: ControlRef::new(link.0),
            icon_class,
        })
    }
}

impl PageAutomation for CcbSite {
    async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        self.session.navigate(&self.site.login_url).await?;
        info!("Login page opened");
        pause(self.timing.page_load_wait_secs).await;

        let username = self
            .session
            .find_element(Locator::Css("[name=\"Email\"]"))
            .await?;
        self.session.send_keys(&username, &credentials.username).await?;
        debug!("Username entered");

        let password = self
            .session
            .find_element(Locator::Css("[name=\"passwd\"]"))
            .await?;
        self.session.send_keys(&password, &credentials.password).await?;
        debug!("Password entered");

        let submit = self.session.find_element(Locator::Css(".btn-primary")).await?;
        self.session.click(&submit).await.context("Failed to submit login form")?;
        info!("Login submitted for {}", credentials.username);

        pause(self.timing.login_wait_secs).await;
        Ok(())
    }

    async fn open_day(&mut self, day: NaiveDate) -> Result<()> {
        let day_of_month = day.day().to_string();
        // The last days of the calendar may sit below the fold.
        self.scroll_to_bottom().await?;
        let button = self
            .session
            .find_element(Locator::LinkText(&day_of_month))
            .await
            .with_context(|| format!("Day {} not found in the calendar", day))?;
        if let Some(href) = self.session.element_attribute(&button, "href").await? {
            debug!("Day link: {}", href);
        }
        self.session.click(&button).await?;
        self.scroll_to_bottom().await?;
        info!("Day found: {}", day);
        Ok(())
    }

    async fn scrape_rows(&mut self) -> Result<Vec<RawRow>> {
        // The first table is the calendar, the second lists the activities
        // of the selected day.
        let tables = self
            .session
            .find_elements(Locator::Css(".table-striped"))
            .await?;
        let Some(table) = tables.get(1) else {
            bail!("Activities table not found ({} tables on page)", tables.len());
        };

        let rows = self.session.find_elements_in(table, Locator::Css("tr")).await?;
        let mut scraped = Vec::with_capacity(rows.len().saturating_sub(HEADER_ROWS));

        for (index, row) in rows.iter().enumerate().skip(HEADER_ROWS) {
            let cells = self.session.find_elements_in(row, Locator::TagName("td")).await?;
            match cells.len() {
                ACTIVITY_CELLS => match self.read_row(&cells).await {
                    Ok(row) => scraped.push(row),
                    Err(e) => warn!("Row {} could not be read, skipping: {:#}", index, e),
                },
                n if n > ACTIVITY_CELLS => {
                    debug!("Row {} has {} cells (registered layout), skipping", index, n);
                }
                n => warn!("Row {} has only {} cells, skipping", index, n),
            }
        }

        debug!("Scraped {} activity rows", scraped.len());
        Ok(scraped)
    }

    async fn click(&mut self, control: &ControlRef) -> Result<()> {
        self.session
            .click(&ElementId(control.as_str().to_string()))
            .await
    }

    async fn fallback_click(&mut self, control: &ControlRef) -> Result<()> {
        let element = ElementId(control.as_str().to_string());
        self.session
            .execute_script(SCRIPT_CLICK, vec![element.to_json()])
            .await?;
        Ok(())
    }
}

async fn pause(secs: u64) {
    if secs > 0 {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }
}
