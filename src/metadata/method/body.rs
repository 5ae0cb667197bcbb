use crate::{
    file::io::{read_le, read_le_at},
    metadata::{
        method::{ExceptionHandler, ExceptionHandlerFlags, MethodBodyFlags, SectionFlags},
        token::Token,
    },
    Error::OutOfBounds,
    Result,
};

/// Default evaluation stack depth of tiny method bodies
pub const TINY_MAX_STACK: usize = 8;

/// A parsed method body header, including its exception handling sections.
///
/// The header is either *tiny* (one byte, code size < 64, no locals, no exception
/// handlers) or *fat* (12 bytes, optionally followed by 4-byte aligned data sections that
/// carry the exception handling clauses). See ECMA-335 II.25.4.
pub struct MethodBody {
    /// Size of the IL code in bytes
    pub size_code: usize,
    /// Size of the header in bytes
    pub size_header: usize,
    /// Token of the local variable signature, null when there are no locals
    pub local_var_sig_token: Token,
    /// Maximum evaluation stack depth
    pub max_stack: usize,
    /// Is this a fat header
    pub is_fat: bool,
    /// Are locals zero-initialized
    pub is_init_local: bool,
    /// Does the body carry exception handling data
    pub is_exception_data: bool,
    /// Raw exception handling clauses, in declaration order
    pub exception_handlers: Vec<ExceptionHandler>,
}

impl MethodBody {
    /// Parse the method body at the start of `data`
    ///
    /// ## Arguments
    /// * `data` - The header, code and any trailing data sections
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for unknown header formats and
    /// [`crate::Error::OutOfBounds`] when `data` is shorter than the declared sizes.
    pub fn from(data: &[u8]) -> Result<MethodBody> {
        if data.is_empty() {
            return Err(malformed_error!("Provided data for body parsing is empty"));
        }

        let first_byte = read_le::<u8>(data)?;
        match MethodBodyFlags::from_bits_truncate(u16::from(first_byte & 0b_00000011_u8)) {
            MethodBodyFlags::TINY_FORMAT => {
                let size_code = (first_byte >> 2) as usize;
                if size_code + 1 > data.len() {
                    return Err(OutOfBounds);
                }

                Ok(MethodBody {
                    size_code,
                    size_header: 1,
                    local_var_sig_token: Token(0),
                    max_stack: TINY_MAX_STACK,
                    is_fat: false,
                    is_init_local: false,
                    is_exception_data: false,
                    exception_handlers: Vec::new(),
                })
            }
            MethodBodyFlags::FAT_FORMAT => {
                if data.len() < 12 {
                    return Err(OutOfBounds);
                }

                let first_duo = read_le::<u16>(data)?;

                let size_header = (first_duo >> 12) as usize * 4;
                if size_header < 12 {
                    return Err(malformed_error!(
                        "Fat method header declares a size of {} bytes",
                        size_header
                    ));
                }

                let size_code = read_le::<u32>(&data[4..])? as usize;
                if data.len() < size_code + size_header {
                    return Err(OutOfBounds);
                }

                let local_var_sig_token = Token(read_le::<u32>(&data[8..])?);
                let flags_header =
                    MethodBodyFlags::from_bits_truncate(first_duo & 0b_0000111111111111_u16);
                let max_stack = read_le::<u16>(&data[2..])? as usize;

                let is_init_local = flags_header.contains(MethodBodyFlags::INIT_LOCALS);

                let exception_handlers = if flags_header.contains(MethodBodyFlags::MORE_SECTS) {
                    Self::read_sections(data, size_header + size_code)?
                } else {
                    Vec::new()
                };

                Ok(MethodBody {
                    size_code,
                    size_header,
                    local_var_sig_token,
                    max_stack,
                    is_fat: true,
                    is_init_local,
                    is_exception_data: !exception_handlers.is_empty(),
                    exception_handlers,
                })
            }
            _ => Err(malformed_error!(
                "MethodHeader is neither FAT nor TINY - {}",
                first_byte
            )),
        }
    }

    // Exception Handling -> II.25.4.5 / II.25.4.6
    #[allow(clippy::cast_possible_truncation)]
    fn read_sections(data: &[u8], code_end: usize) -> Result<Vec<ExceptionHandler>> {
        let mut exception_handlers = Vec::new();
        let mut cursor = (code_end + 3) & !3;

        while data.len() >= cursor + 4 {
            let section_flags = SectionFlags::from_bits_truncate(read_le::<u8>(&data[cursor..])?);
            if !section_flags.contains(SectionFlags::EHTABLE) {
                break;
            }

            let (section_size, clause_size) = if section_flags.contains(SectionFlags::FAT_FORMAT)
            {
                (
                    (read_le::<u32>(&data[cursor..])? >> 8) as usize,
                    24_usize,
                )
            } else {
                (usize::from(read_le::<u8>(&data[cursor + 1..])?), 12_usize)
            };

            if section_size < 4 || data.len() < cursor + section_size {
                return Err(malformed_error!(
                    "Exception section at {} declares {} bytes, {} available",
                    cursor,
                    section_size,
                    data.len() - cursor
                ));
            }

            let section_end = cursor + section_size;
            cursor += 4;

            for _ in 0..(section_size - 4) / clause_size {
                let handler = if clause_size == 24 {
                    // Intentionally truncating u32 to u16, the upper bits are reserved
                    ExceptionHandler {
                        flags: ExceptionHandlerFlags::from_bits_truncate(
                            read_le_at::<u32>(data, &mut cursor)? as u16,
                        ),
                        try_offset: read_le_at::<u32>(data, &mut cursor)?,
                        try_length: read_le_at::<u32>(data, &mut cursor)?,
                        handler_offset: read_le_at::<u32>(data, &mut cursor)?,
                        handler_length: read_le_at::<u32>(data, &mut cursor)?,
                        filter_offset: read_le_at::<u32>(data, &mut cursor)?,
                    }
                } else {
                    ExceptionHandler {
                        flags: ExceptionHandlerFlags::from_bits_truncate(read_le_at::<u16>(
                            data,
                            &mut cursor,
                        )?),
                        try_offset: u32::from(read_le_at::<u16>(data, &mut cursor)?),
                        try_length: u32::from(read_le_at::<u8>(data, &mut cursor)?),
                        handler_offset: u32::from(read_le_at::<u16>(data, &mut cursor)?),
                        handler_length: u32::from(read_le_at::<u8>(data, &mut cursor)?),
                        filter_offset: read_le_at::<u32>(data, &mut cursor)?,
                    }
                };
                exception_handlers.push(handler);
            }

            if !section_flags.contains(SectionFlags::MORE_SECTS) {
                break;
            }

            cursor = (section_end + 3) & !3;
        }

        Ok(exception_handlers)
    }

    /// Total size of header and code in bytes
    #[must_use]
    pub fn size(&self) -> usize {
        self.size_code + self.size_header
    }

    /// The IL code of this body within `data`, the buffer it was parsed from
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `data` is not the buffer this body was
    /// parsed from.
    pub fn code<'a>(&self, data: &'a [u8]) -> Result<&'a [u8]> {
        data.get(self.size_header..self.size()).ok_or(OutOfBounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiny() {
        // ldarg.0; ldc.i4.1; add; ret
        let data = [0x12, 0x02, 0x17, 0x58, 0x2A];

        let method_header = MethodBody::from(&data).unwrap();

        assert!(!method_header.is_fat);
        assert!(!method_header.is_exception_data);
        assert!(!method_header.is_init_local);
        assert_eq!(method_header.max_stack, TINY_MAX_STACK);
        assert_eq!(method_header.size_code, 4);
        assert_eq!(method_header.size_header, 1);
        assert_eq!(method_header.size(), 5);
        assert!(method_header.local_var_sig_token.is_null());
        assert_eq!(method_header.code(&data).unwrap(), &[0x02, 0x17, 0x58, 0x2A]);
    }

    #[test]
    fn tiny_truncated() {
        let data = [0x12, 0x02];
        assert!(matches!(MethodBody::from(&data), Err(OutOfBounds)));
    }

    #[test]
    fn fat() {
        #[rustfmt::skip]
        let data = [
            0x13, 0x30, 0x05, 0x00,         // flags: fat + init locals, header size 3, maxstack 5
            0x02, 0x00, 0x00, 0x00,         // code size
            0x59, 0x00, 0x00, 0x11,         // local var sig token
            0x00, 0x2A,                     // nop; ret
        ];

        let method_header = MethodBody::from(&data).unwrap();

        assert!(method_header.is_fat);
        assert!(!method_header.is_exception_data);
        assert!(method_header.is_init_local);
        assert_eq!(method_header.max_stack, 5);
        assert_eq!(method_header.size_code, 2);
        assert_eq!(method_header.size_header, 12);
        assert_eq!(method_header.size(), 14);
        assert_eq!(method_header.local_var_sig_token, Token(0x1100_0059));
    }

    #[test]
    fn fat_small_exception_section() {
        #[rustfmt::skip]
        let data = [
            0x1B, 0x30, 0x02, 0x00,         // fat + more sects + init locals
            0x04, 0x00, 0x00, 0x00,         // code size
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0xDD, 0x2A,         // code (4 bytes, already aligned)
            0x01, 0x10, 0x00, 0x00,         // EHTABLE, small, 16 bytes
            0x00, 0x00,                     // flags: catch
            0x00, 0x00, 0x01,               // try 0, length 1
            0x01, 0x00, 0x02,               // handler 1, length 2
            0x01, 0x00, 0x00, 0x01,         // class token 0x01000001
        ];

        let method_header = MethodBody::from(&data).unwrap();

        assert!(method_header.is_exception_data);
        assert_eq!(method_header.exception_handlers.len(), 1);
        let handler = &method_header.exception_handlers[0];
        assert!(handler.is_catch());
        assert_eq!(handler.try_offset, 0);
        assert_eq!(handler.try_length, 1);
        assert_eq!(handler.handler_offset, 1);
        assert_eq!(handler.handler_length, 2);
        assert_eq!(handler.class_token(), Token(0x0100_0001));
    }

    #[test]
    fn fat_exception_section() {
        #[rustfmt::skip]
        let data = [
            0x1B, 0x30, 0x02, 0x00,
            0x02, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x2A,                     // code
            0x00, 0x00,                     // padding
            0x41, 0x1C, 0x00, 0x00,         // EHTABLE | FAT, 28 bytes
            0x02, 0x00, 0x00, 0x00,         // finally
            0x00, 0x00, 0x00, 0x00,         // try offset
            0x01, 0x00, 0x00, 0x00,         // try length
            0x01, 0x00, 0x00, 0x00,         // handler offset
            0x01, 0x00, 0x00, 0x00,         // handler length
            0x00, 0x00, 0x00, 0x00,
        ];

        let method_header = MethodBody::from(&data).unwrap();

        assert_eq!(method_header.exception_handlers.len(), 1);
        let handler = &method_header.exception_handlers[0];
        assert_eq!(handler.flags, ExceptionHandlerFlags::FINALLY);
        assert!(!handler.is_catch());
        assert_eq!(handler.handler_offset, 1);
    }

    #[test]
    fn invalid_header() {
        assert!(MethodBody::from(&[0x00]).is_err());
        assert!(MethodBody::from(&[]).is_err());
    }
}
