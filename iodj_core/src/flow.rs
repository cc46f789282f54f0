//! Page navigation: Login → Diary → Loading → Player, with Player and Diary
//! able to open the saved playlist list.
//!
//! The loading page leaves only after the generation request has completed
//! *and* its minimum display time has passed. A failed generation sends the
//! user back to the diary.

use std::fmt;

use tracing::{debug, info};

use crate::error::FlowError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Page {
    #[default]
    Login,
    Diary,
    Loading,
    Player,
    Playlists,
}

impl Page {
    pub fn name(&self) -> &'static str {
        match self {
            Page::Login => "login",
            Page::Diary => "diary",
            Page::Loading => "loading",
            Page::Player => "player",
            Page::Playlists => "playlists",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tracks the two conditions that end the loading page.
#[derive(Debug, Default, PartialEq, Eq)]
struct LoadingGate {
    generation_done: bool,
    floor_elapsed: bool,
}

#[derive(Debug, Default)]
pub struct Navigator {
    page: Page,
    gate: LoadingGate,
}

impl Navigator {
    /// Starts on the login page.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn start_diary(&mut self, logged_in: bool) -> Result<Page, FlowError> {
        if !logged_in {
            return Err(self.reject("write a diary without logging in"));
        }
        self.allow(&[Page::Login, Page::Playlists], "start a diary")?;
        Ok(self.go(Page::Diary))
    }

    pub fn submit_diary(&mut self) -> Result<Page, FlowError> {
        self.allow(&[Page::Diary], "submit a diary")?;
        self.gate = LoadingGate::default();
        Ok(self.go(Page::Loading))
    }

    /// The minimum display time of the loading page has passed.
    pub fn loading_floor_elapsed(&mut self) -> Page {
        if self.page == Page::Loading {
            self.gate.floor_elapsed = true;
            self.leave_loading_if_done();
        }
        self.page
    }

    /// Generation finished. On failure the diary is shown again.
    pub fn generation_finished(&mut self, succeeded: bool) -> Page {
        if self.page != Page::Loading {
            debug!(page = %self.page, "generation finished after leaving the loading page");
            return self.page;
        }
        if !succeeded {
            return self.go(Page::Diary);
        }
        self.gate.generation_done = true;
        self.leave_loading_if_done();
        self.page
    }

    pub fn open_playlists(&mut self) -> Result<Page, FlowError> {
        self.allow(&[Page::Player, Page::Diary], "open saved playlists")?;
        Ok(self.go(Page::Playlists))
    }

    pub fn select_playlist(&mut self) -> Result<Page, FlowError> {
        self.allow(&[Page::Playlists, Page::Player], "select a playlist")?;
        Ok(self.go(Page::Player))
    }

    pub fn logout(&mut self) -> Page {
        self.gate = LoadingGate::default();
        self.go(Page::Login)
    }

    fn leave_loading_if_done(&mut self) {
        if self.gate.generation_done && self.gate.floor_elapsed {
            self.gate = LoadingGate::default();
            self.go(Page::Player);
        }
    }

    fn allow(&self, from: &[Page], action: &'static str) -> Result<(), FlowError> {
        if from.contains(&self.page) {
            Ok(())
        } else {
            Err(self.reject(action))
        }
    }

    fn reject(&self, action: &'static str) -> FlowError {
        FlowError {
            from: self.page.name(),
            action,
        }
    }

    fn go(&mut self, page: Page) -> Page {
        if self.page != page {
            info!(from = %self.page, to = %page, "navigating");
            self.page = page;
        }
        page
    }
}
