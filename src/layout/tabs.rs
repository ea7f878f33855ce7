//! Column alignment for tab-separated fields.

/// One tab column, measured from the line origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TabStop {
    /// Where the field starts.
    pub offset: u32,
    /// Field width up to the next field.
    pub width: u32,
}

impl TabStop {
    /// Where the next field starts.
    #[must_use]
    pub const fn end(&self) -> u32 {
        self.offset + self.width
    }
}

/// Column boundaries established by the first line containing a tab.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TabColumns {
    stops: Vec<TabStop>,
    established: bool,
}

impl TabColumns {
    #[must_use]
    pub const fn is_established(&self) -> bool {
        self.established
    }

    #[must_use]
    pub fn stops(&self) -> &[TabStop] {
        &self.stops
    }

    /// Fix the columns; later calls are ignored.
    pub fn establish(&mut self, stops: Vec<TabStop>) {
        if !self.established {
            self.stops = stops;
            self.established = true;
        }
    }

    /// Drop the columns so the next tabbed line establishes them again.
    pub fn reset(&mut self) {
        self.stops.clear();
        self.established = false;
    }

    /// Advance of a tab found at `x` inside field `field`.
    ///
    /// Established columns jump to the start of the next field. Otherwise,
    /// or past the last column, the tab moves to the next multiple of `step`.
    #[must_use]
    pub fn tab_advance(&self, field: usize, x: u32, step: u32) -> u32 {
        if let Some(stop) = self.stops.get(field).filter(|_| self.established) {
            return stop.end().saturating_sub(x);
        }
        let step = step.max(1);
        step - x % step
    }

    /// Rightmost pixel a character of field `field` may reach, keeping `gap`
    /// pixels free before the next field.
    #[must_use]
    pub fn clip_limit(&self, field: usize, gap: u32) -> Option<u32> {
        if !self.established {
            return None;
        }
        self.stops
            .get(field)
            .map(|stop| stop.end().saturating_sub(gap))
    }
}
