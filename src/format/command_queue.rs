use crate::error::ViconError;
use crate::format::buffer::LittleEndianBuffer;
use crate::format::{
    PATH_COMMAND_CURVE, PATH_COMMAND_H_LINE, PATH_COMMAND_LINE, PATH_COMMAND_V_LINE,
};
use crate::geom::Point;
use crate::model::VectorPath;

/// Reader/writer for the command-encoded path payload.
///
/// Each segment is classified into one of four 2-bit commands packed four
/// to a byte, least significant bits first; the command buffer is followed
/// by the coordinate payload. H- and v-lines store only the changing
/// coordinate, the other one is inherited from the previous vertex (the
/// implicit start is the origin).
#[derive(Default)]
pub struct PathCommandQueue {
    command_buffer: LittleEndianBuffer,
    point_buffer: LittleEndianBuffer,
    command_byte: u8,
    command_pos: u32,
}

impl PathCommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the command-encoded payload for `path` to `buffer`.
    pub fn write(
        mut self,
        buffer: &mut LittleEndianBuffer,
        path: &VectorPath,
        point_count: usize,
    ) -> Result<(), ViconError> {
        let mut last = Point::ORIGIN;

        for p in path.points().iter().take(point_count) {
            if p.is_plain() {
                if p.point.x == last.x {
                    self.append_command(PATH_COMMAND_V_LINE);
                    self.point_buffer.write_coord(p.point.y as f32);
                } else if p.point.y == last.y {
                    self.append_command(PATH_COMMAND_H_LINE);
                    self.point_buffer.write_coord(p.point.x as f32);
                } else {
                    self.append_command(PATH_COMMAND_LINE);
                    self.point_buffer.write_coord(p.point.x as f32);
                    self.point_buffer.write_coord(p.point.y as f32);
                }
            } else {
                self.append_command(PATH_COMMAND_CURVE);
                self.point_buffer.write_coord(p.point.x as f32);
                self.point_buffer.write_coord(p.point.y as f32);
                self.point_buffer.write_coord(p.point_in.x as f32);
                self.point_buffer.write_coord(p.point_in.y as f32);
                self.point_buffer.write_coord(p.point_out.x as f32);
                self.point_buffer.write_coord(p.point_out.y as f32);
            }
            last = p.point;
        }

        if self.command_pos > 0 {
            // Flush the partially filled trailing command byte.
            self.command_buffer.write_u8(self.command_byte);
        }

        buffer.write_buffer(&self.command_buffer);
        buffer.write_buffer(&self.point_buffer);
        Ok(())
    }

    /// Reads `point_count` command-encoded vertices into `path`.
    pub fn read(
        buffer: &mut LittleEndianBuffer,
        path: &mut VectorPath,
        point_count: usize,
    ) -> Result<(), ViconError> {
        let command_buffer_size = (point_count + 3) / 4;
        let commands = buffer.read_bytes(command_buffer_size)?.to_vec();

        let mut last = Point::ORIGIN;
        for i in 0..point_count {
            let command = (commands[i / 4] >> ((i % 4) * 2)) & 0x03;

            let (point, point_in, point_out) = match command {
                PATH_COMMAND_H_LINE => {
                    let x = buffer.read_coord()? as f64;
                    let p = Point::new(x, last.y);
                    (p, p, p)
                }
                PATH_COMMAND_V_LINE => {
                    let y = buffer.read_coord()? as f64;
                    let p = Point::new(last.x, y);
                    (p, p, p)
                }
                PATH_COMMAND_LINE => {
                    let x = buffer.read_coord()? as f64;
                    let y = buffer.read_coord()? as f64;
                    let p = Point::new(x, y);
                    (p, p, p)
                }
                _ => {
                    let x = buffer.read_coord()? as f64;
                    let y = buffer.read_coord()? as f64;
                    let in_x = buffer.read_coord()? as f64;
                    let in_y = buffer.read_coord()? as f64;
                    let out_x = buffer.read_coord()? as f64;
                    let out_y = buffer.read_coord()? as f64;
                    (
                        Point::new(x, y),
                        Point::new(in_x, in_y),
                        Point::new(out_x, out_y),
                    )
                }
            };

            path.add_point_full(point, point_in, point_out, false);
            last = point;
        }

        Ok(())
    }

    fn append_command(&mut self, command: u8) {
        self.command_byte |= command << self.command_pos;
        self.command_pos += 2;
        if self.command_pos == 8 {
            let byte = self.command_byte;
            self.command_byte = 0;
            self.command_pos = 0;
            self.command_buffer.write_u8(byte);
        }
    }
}
