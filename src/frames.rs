//! Frame Table Allocator
//!
//! A fixed-size array of frame slots, each either free or assigned to
//! exactly one resident process and logical page number. Admission assigns
//! the lowest-indexed free frames, so a newly admitted process of k frames
//! always gets ascending page numbers 1..=k; frames freed in between runs
//! mean a process's frames need not be contiguous in the table.

use std::fmt;

/// One frame slot. Free frames carry no owner or page number.
#[derive(Debug, Clone, Copy, Default)]
struct Frame {
    assigned: bool,
    owner: u32,
    page: u32,
}

/// The allocator: capacity test, ascending-index assignment, bulk release.
#[derive(Debug, Clone)]
pub struct FrameTable {
    frames: Vec<Frame>,
    page_size: u64,
}

impl FrameTable {
    pub fn new(num_frames: usize, page_size: u64) -> Self {
        FrameTable {
            frames: vec![Frame::default(); num_frames],
            page_size,
        }
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Frames currently unassigned
    pub fn free_frames(&self) -> usize {
        self.frames.iter().filter(|f| !f.assigned).count()
    }

    /// Frames currently owned by the given process
    pub fn frames_owned_by(&self, pid: u32) -> usize {
        self.frames.iter().filter(|f| f.assigned && f.owner == pid).count()
    }

    /// Whether the free frames cover the demand. Exact for any positive
    /// page size: `free * page_size >= demand` iff `free >= ceil(demand / page_size)`.
    pub fn can_admit(&self, demand: u64) -> bool {
        self.free_frames() as u64 * self.page_size >= demand
    }

    /// Assign free frames in ascending index order until the demand is
    /// covered; page numbers count up from 1. Internal fragmentation in the
    /// last frame is not tracked. The caller must have checked `can_admit`
    /// first; without that the scan under-assigns silently.
    ///
    /// Returns the number of frames assigned.
    pub fn admit(&mut self, pid: u32, demand: u64) -> usize {
        let mut covered = 0u64;
        let mut page = 0u32;

        for frame in self.frames.iter_mut() {
            if !frame.assigned {
                page += 1;
                frame.assigned = true;
                frame.owner = pid;
                frame.page = page;
                covered += self.page_size;
            }
            if covered >= demand {
                break;
            }
        }

        page as usize
    }

    /// Clear every frame owned by the process, in a single pass. A pid that
    /// owns no frames is a no-op. Returns the number of frames released.
    pub fn release(&mut self, pid: u32) -> usize {
        let mut released = 0;
        for frame in self.frames.iter_mut() {
            if frame.assigned && frame.owner == pid {
                *frame = Frame::default();
                released += 1;
            }
        }
        released
    }

    pub fn is_entirely_free(&self) -> bool {
        self.frames.iter().all(|f| !f.assigned)
    }

    /// Read-only projection of the table: contiguous runs of free space
    /// collapsed into one entry, assigned frames listed individually with
    /// their byte ranges. Reporting only.
    pub fn describe(&self) -> Vec<MapEntry> {
        let mut entries = Vec::new();
        let mut free_start: Option<usize> = None;

        for (i, frame) in self.frames.iter().enumerate() {
            if frame.assigned {
                if let Some(start) = free_start.take() {
                    entries.push(MapEntry::Free {
                        start: start as u64 * self.page_size,
                        end: i as u64 * self.page_size - 1,
                    });
                }
                entries.push(MapEntry::Assigned {
                    start: i as u64 * self.page_size,
                    end: (i + 1) as u64 * self.page_size - 1,
                    pid: frame.owner,
                    page: frame.page,
                });
            } else if free_start.is_none() {
                free_start = Some(i);
            }
        }

        if let Some(start) = free_start {
            entries.push(MapEntry::Free {
                start: start as u64 * self.page_size,
                end: self.frames.len() as u64 * self.page_size - 1,
            });
        }

        entries
    }
}

/// One line of the memory map projection; byte ranges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapEntry {
    Free { start: u64, end: u64 },
    Assigned { start: u64, end: u64, pid: u32, page: u32 },
}

impl fmt::Display for MapEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapEntry::Free { start, end } => {
                write!(f, "{}-{}: Free frame(s)", start, end)
            }
            MapEntry::Assigned { start, end, pid, page } => {
                write!(f, "{}-{}: Process {}, Page {}", start, end, pid, page)
            }
        }
    }
}
