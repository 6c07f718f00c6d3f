//! External per-track timecode factories (§4.5, §6.4): v1 range-based,
//! v2 explicit-list, v3 duration+fps-with-gaps. Each overrides the
//! source timecodes a reader would otherwise compute.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimecodeFileError {
    #[error("missing or unrecognized timecode format header")]
    BadHeader,
    #[error("line {line}: {reason}")]
    BadLine { line: usize, reason: String },
}

/// How a factory is consulted while a packetizer assigns timecodes
/// (§4.5 "Mode of application").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueMode {
    /// File format has reliable timing; factory is not consulted.
    None,
    /// One-packet look-ahead; used when readers can compute durations
    /// themselves.
    ShortQueueing,
    /// Packetizer buffers frames until the next timecode is known, so
    /// durations can be computed in order.
    FullQueueing,
}

fn round_half_up_ns(seconds: f64) -> i64 {
    (seconds * 1_000_000_000.0).round() as i64
}

/// v1: default FPS plus ordered `start_frame..end_frame -> fps` ranges.
pub struct V1Factory {
    default_fps: f64,
    ranges: Vec<(u64, u64, f64)>,
}

impl V1Factory {
    pub fn new(default_fps: f64, ranges: Vec<(u64, u64, f64)>) -> Self {
        V1Factory { default_fps, ranges }
    }

    pub fn parse(text: &str) -> Result<Self, TimecodeFileError> {
        let mut lines = non_comment_lines(text);

        let header = lines.next().ok_or(TimecodeFileError::BadHeader)?;
        if header.trim() != "# timecode format v1" {
            return Err(TimecodeFileError::BadHeader);
        }

        let default_fps: f64 = lines
            .next()
            .ok_or(TimecodeFileError::BadHeader)?
            .trim()
            .parse()
            .map_err(|_| TimecodeFileError::BadHeader)?;

        let mut ranges = Vec::new();
        for (i, line) in lines.enumerate() {
            let parts: Vec<&str> = line.split(',').collect();
            if parts.len() != 3 {
                return Err(TimecodeFileError::BadLine {
                    line: i + 3,
                    reason: "expected start,end,fps".to_string(),
                });
            }

            let start: u64 = parts[0]
                .trim()
                .parse()
                .map_err(|_| TimecodeFileError::BadLine {
                    line: i + 3,
                    reason: "bad start_frame".to_string(),
                })?;
            let end: u64 = parts[1]
                .trim()
                .parse()
                .map_err(|_| TimecodeFileError::BadLine {
                    line: i + 3,
                    reason: "bad end_frame".to_string(),
                })?;
            let fps: f64 = parts[2]
                .trim()
                .parse()
                .map_err(|_| TimecodeFileError::BadLine {
                    line: i + 3,
                    reason: "bad fps".to_string(),
                })?;

            ranges.push((start, end, fps));
        }

        Ok(V1Factory::new(default_fps, ranges))
    }

    /// Cumulative timecode (ns) for `frame_index`, walking range
    /// boundaries in order and falling back to `default_fps` outside
    /// any declared range.
    pub fn get_next(&self, frame_index: u64) -> i64 {
        let mut elapsed_seconds = 0.0;
        let mut frame = 0u64;

        while frame < frame_index {
            let fps = self
                .ranges
                .iter()
                .find(|(start, end, _)| frame >= *start && frame <= *end)
                .map(|(_, _, fps)| *fps)
                .unwrap_or(self.default_fps);

            elapsed_seconds += 1.0 / fps;
            frame += 1;
        }

        round_half_up_ns(elapsed_seconds)
    }

    pub fn get_default_duration(&self, proposed: i64) -> i64 {
        if self.default_fps > 0.0 {
            round_half_up_ns(1.0 / self.default_fps)
        } else {
            proposed
        }
    }
}

/// v2: an explicit list of per-frame timecodes (ms on disk, ns in core).
pub struct V2Factory {
    timecodes_ns: Vec<i64>,
    default_fps: Option<f64>,
}

impl V2Factory {
    pub fn new(timecodes_ns: Vec<i64>, default_fps: Option<f64>) -> Self {
        V2Factory {
            timecodes_ns,
            default_fps,
        }
    }

    pub fn parse(text: &str) -> Result<Self, TimecodeFileError> {
        let mut lines = non_comment_lines(text);

        let header = lines.next().ok_or(TimecodeFileError::BadHeader)?;
        if header.trim() != "# timecode format v2" {
            return Err(TimecodeFileError::BadHeader);
        }

        let mut timecodes_ns = Vec::new();
        for (i, line) in lines.enumerate() {
            let ms: f64 = line
                .trim()
                .parse()
                .map_err(|_| TimecodeFileError::BadLine {
                    line: i + 2,
                    reason: "bad timecode".to_string(),
                })?;
            timecodes_ns.push((ms * 1_000_000.0).round() as i64);
        }

        Ok(V2Factory::new(timecodes_ns, None))
    }

    pub fn get_timecode(&self, frame_index: usize) -> Option<i64> {
        self.timecodes_ns.get(frame_index).copied()
    }

    /// Duration to the next frame; for the last frame, reuses the
    /// default FPS if set, else the final observed delta.
    pub fn get_duration(&self, frame_index: usize) -> Option<i64> {
        let current = self.get_timecode(frame_index)?;

        if let Some(next) = self.get_timecode(frame_index + 1) {
            return Some(next - current);
        }

        if let Some(fps) = self.default_fps {
            return Some(round_half_up_ns(1.0 / fps));
        }

        if frame_index > 0 {
            let prev = self.get_timecode(frame_index - 1)?;
            return Some(current - prev);
        }

        None
    }

    pub fn get_default_duration(&self, proposed: i64) -> i64 {
        self.default_fps
            .map(|fps| round_half_up_ns(1.0 / fps))
            .unwrap_or(proposed)
    }
}

/// v3: ordered (duration, fps) segments; fps == -1.0 denotes a gap.
pub struct V3Factory {
    default_fps: f64,
    segments: Vec<(f64, f64)>,
}

impl V3Factory {
    pub fn new(default_fps: f64, segments: Vec<(f64, f64)>) -> Self {
        V3Factory {
            default_fps,
            segments,
        }
    }

    pub fn parse(text: &str) -> Result<Self, TimecodeFileError> {
        let mut lines = non_comment_lines(text);

        let header = lines.next().ok_or(TimecodeFileError::BadHeader)?;
        if header.trim() != "# timecode format v3" {
            return Err(TimecodeFileError::BadHeader);
        }

        let default_fps: f64 = lines
            .next()
            .ok_or(TimecodeFileError::BadHeader)?
            .trim()
            .parse()
            .map_err(|_| TimecodeFileError::BadHeader)?;

        let mut segments = Vec::new();
        for (i, line) in lines.enumerate() {
            let parts: Vec<&str> = line.split(',').collect();
            if parts.len() != 2 {
                return Err(TimecodeFileError::BadLine {
                    line: i + 3,
                    reason: "expected duration,fps".to_string(),
                });
            }

            let duration: f64 = parts[0]
                .trim()
                .parse()
                .map_err(|_| TimecodeFileError::BadLine {
                    line: i + 3,
                    reason: "bad duration".to_string(),
                })?;
            let fps: f64 = parts[1]
                .trim()
                .parse()
                .map_err(|_| TimecodeFileError::BadLine {
                    line: i + 3,
                    reason: "bad fps".to_string(),
                })?;

            segments.push((duration, fps));
        }

        Ok(V3Factory::new(default_fps, segments))
    }

    /// Whether any segment in this factory is a gap (fps == -1), which
    /// tells the cluster helper to break the cluster there.
    pub fn contains_gap(&self) -> bool {
        self.segments.iter().any(|(_, fps)| *fps < 0.0)
    }

    /// Cumulative timecode (ns) for `frame_index`, walking segments in
    /// declared order; a gap segment (fps < 0) advances elapsed time by
    /// its duration without producing frames.
    pub fn get_timecode_ns(&self, frame_index: usize) -> i64 {
        let mut elapsed_seconds = 0.0;
        let mut frame = 0usize;

        for (duration, fps) in &self.segments {
            if *fps < 0.0 {
                elapsed_seconds += duration;
                continue;
            }

            let frames_in_segment = (duration * fps).round() as usize;
            if frame + frames_in_segment > frame_index {
                elapsed_seconds += (frame_index - frame) as f64 / fps;
                return round_half_up_ns(elapsed_seconds);
            }

            frame += frames_in_segment;
            elapsed_seconds += duration;
        }

        if self.default_fps > 0.0 {
            elapsed_seconds += (frame_index - frame) as f64 / self.default_fps;
        }
        round_half_up_ns(elapsed_seconds)
    }

    pub fn get_default_duration(&self, proposed: i64) -> i64 {
        if self.default_fps > 0.0 {
            round_half_up_ns(1.0 / self.default_fps)
        } else {
            proposed
        }
    }
}

fn non_comment_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut lines = text.lines();
    let header = lines.next();

    header.into_iter().chain(lines.filter(|l| {
        let trimmed = l.trim();
        !trimmed.is_empty() && (!trimmed.starts_with('#') || trimmed.starts_with("# timecode"))
    }))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn v1_parses_and_walks_ranges() {
        let text = "# timecode format v1\n30\n0,9,25\n";
        let factory = V1Factory::parse(text).unwrap();

        // Frames 0..9 run at 25fps (40ms/frame); frame 1 is 40ms in.
        assert_eq!(factory.get_next(0), 0);
        assert_eq!(factory.get_next(1), 40_000_000);
    }

    #[test]
    fn v1_falls_back_to_default_fps_outside_ranges() {
        let text = "# timecode format v1\n25\n0,0,50\n";
        let factory = V1Factory::parse(text).unwrap();

        // frame 0->1 at 50fps (20ms), frame 1->2 at default 25fps (40ms).
        assert_eq!(factory.get_next(1), 20_000_000);
        assert_eq!(factory.get_next(2), 60_000_000);
    }

    #[test]
    fn v2_parses_ms_lines_into_ns() {
        let text = "# timecode format v2\n0\n33.366\n66.733\n";
        let factory = V2Factory::parse(text).unwrap();

        assert_eq!(factory.get_timecode(0), Some(0));
        assert_eq!(factory.get_timecode(1), Some(33_366_000));
    }

    #[test]
    fn v2_last_frame_duration_reuses_previous_delta() {
        let text = "# timecode format v2\n0\n100\n250\n";
        let factory = V2Factory::parse(text).unwrap();

        assert_eq!(factory.get_duration(0), Some(100_000_000));
        assert_eq!(factory.get_duration(1), Some(150_000_000));
        assert_eq!(factory.get_duration(2), Some(150_000_000));
    }

    #[test]
    fn v3_detects_gaps() {
        let text = "# timecode format v3\n25\n1.0,25\n2.0,-1\n";
        let factory = V3Factory::parse(text).unwrap();
        assert!(factory.contains_gap());
    }

    #[test]
    fn v3_rejects_bad_header() {
        let text = "not a timecode file\n";
        assert!(matches!(V3Factory::parse(text), Err(TimecodeFileError::BadHeader)));
    }
}
