//! Bit packing of a `ControlRegisterImage` into termios flag words.

use libc::tcflag_t;
use ttyport_core::{CharSize, ControlRegisterImage};

/// The platform's value for every flag a `ControlRegisterImage` manages.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FlagBits {
    pub ignbrk: tcflag_t,
    pub inlcr: tcflag_t,
    pub igncr: tcflag_t,
    pub icrnl: tcflag_t,
    pub inpck: tcflag_t,
    pub ixon: tcflag_t,
    pub ixoff: tcflag_t,

    pub opost: tcflag_t,

    pub clocal: tcflag_t,
    pub cread: tcflag_t,
    pub csize: tcflag_t,
    pub cs5: tcflag_t,
    pub cs6: tcflag_t,
    pub cs7: tcflag_t,
    pub cs8: tcflag_t,
    pub cstopb: tcflag_t,
    pub parenb: tcflag_t,
    pub parodd: tcflag_t,
    pub crtscts: tcflag_t,

    pub icanon: tcflag_t,
    pub echo: tcflag_t,
    pub echoe: tcflag_t,
    pub echok: tcflag_t,
    pub echonl: tcflag_t,
    pub isig: tcflag_t,
    pub iexten: tcflag_t,
}

/// The four termios flag words.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RegisterWords {
    pub input: tcflag_t,
    pub output: tcflag_t,
    pub control: tcflag_t,
    pub local: tcflag_t,
}

impl RegisterWords {
    /// Packs the flags asserted by `image`. Speed codes are not included.
    pub fn pack(image: &ControlRegisterImage, bits: &FlagBits) -> Self {
        let input = &image.input;
        let control = &image.control;
        let local = &image.local;

        let char_size = match control.char_size {
            CharSize::Bits5 => bits.cs5,
            CharSize::Bits6 => bits.cs6,
            CharSize::Bits7 => bits.cs7,
            CharSize::Bits8 => bits.cs8,
        };

        RegisterWords {
            input: flag(input.ignore_break, bits.ignbrk)
                | flag(input.map_nl_to_cr, bits.inlcr)
                | flag(input.ignore_cr, bits.igncr)
                | flag(input.map_cr_to_nl, bits.icrnl)
                | flag(input.check_parity, bits.inpck)
                | flag(input.xon_output, bits.ixon)
                | flag(input.xoff_input, bits.ixoff),
            output: flag(image.output.post_process, bits.opost),
            control: flag(control.ignore_modem_lines, bits.clocal)
                | flag(control.enable_receiver, bits.cread)
                | char_size
                | flag(control.two_stop_bits, bits.cstopb)
                | flag(control.parity_enable, bits.parenb)
                | flag(control.parity_odd, bits.parodd)
                | flag(control.rts_cts, bits.crtscts),
            local: flag(local.canonical, bits.icanon)
                | flag(local.echo, bits.echo)
                | flag(local.echo_erase, bits.echoe)
                | flag(local.echo_kill, bits.echok)
                | flag(local.echo_nl, bits.echonl)
                | flag(local.signals, bits.isig)
                | flag(local.extended_input, bits.iexten),
        }
    }

    /// Every bit an image decides, whether it asserts it or not.
    pub fn managed(bits: &FlagBits) -> Self {
        RegisterWords {
            input: bits.ignbrk | bits.inlcr | bits.igncr | bits.icrnl | bits.inpck | bits.ixon | bits.ixoff,
            output: bits.opost,
            control: bits.clocal
                | bits.cread
                | bits.csize
                | bits.cstopb
                | bits.parenb
                | bits.parodd
                | bits.crtscts,
            local: bits.icanon
                | bits.echo
                | bits.echoe
                | bits.echok
                | bits.echonl
                | bits.isig
                | bits.iexten,
        }
    }

    /// Replaces the managed bits of `current` with these words, keeping everything else.
    pub fn merge_onto(self, current: RegisterWords, bits: &FlagBits) -> Self {
        let managed = RegisterWords::managed(bits);

        RegisterWords {
            input: (current.input & !managed.input) | self.input,
            output: (current.output & !managed.output) | self.output,
            control: (current.control & !managed.control) | self.control,
            local: (current.local & !managed.local) | self.local,
        }
    }
}

fn flag(on: bool, bit: tcflag_t) -> tcflag_t {
    if on {
        bit
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::platform::FLAG_BITS as BITS;
    use ttyport_core::{Family, OpenOptions, ParityMode};

    fn image(options: OpenOptions, family: Family) -> ControlRegisterImage {
        ControlRegisterImage::build(&options, family).unwrap()
    }

    #[test]
    fn raw_8n1_packs_receiver_and_char_size_only() {
        let words = RegisterWords::pack(&image(OpenOptions::default(), Family::Linux), &BITS);

        assert_eq!(words.input, 0);
        assert_eq!(words.output, 0);
        assert_eq!(words.control, BITS.clocal | BITS.cread | BITS.cs8);
        assert_eq!(words.local, 0);
    }

    #[test]
    fn odd_parity_two_stop_bits_seven_data_bits() {
        let options = OpenOptions {
            data_bits: 7,
            stop_bits: 2,
            parity_mode: ParityMode::Odd,
            ..OpenOptions::default()
        };
        let words = RegisterWords::pack(&image(options, Family::Linux), &BITS);

        assert_eq!(words.control & BITS.csize, BITS.cs7);
        assert_ne!(words.control & BITS.cstopb, 0);
        assert_ne!(words.control & BITS.parenb, 0);
        assert_ne!(words.control & BITS.parodd, 0);
        assert_ne!(words.input & BITS.inpck, 0);
    }

    #[test]
    fn even_parity_clears_parodd() {
        let options = OpenOptions { parity_mode: ParityMode::Even, ..OpenOptions::default() };
        let words = RegisterWords::pack(&image(options, Family::Linux), &BITS);

        assert_ne!(words.control & BITS.parenb, 0);
        assert_eq!(words.control & BITS.parodd, 0);
    }

    #[test]
    fn canonical_mode_sets_icanon() {
        let options = OpenOptions { canonical_mode: true, ..OpenOptions::default() };
        let words = RegisterWords::pack(&image(options, Family::Linux), &BITS);

        assert_eq!(words.local, BITS.icanon);
    }

    #[test]
    fn rts_cts_sets_crtscts() {
        let options = OpenOptions { rts_cts_flow_control: true, ..OpenOptions::default() };
        let words = RegisterWords::pack(&image(options, Family::Linux), &BITS);

        assert_ne!(words.control & BITS.crtscts, 0);
    }

    #[test]
    fn merge_scrubs_raw_mode_hostile_flags() {
        let current = RegisterWords {
            input: BITS.icrnl | BITS.ixon | BITS.ignbrk | BITS.inlcr | BITS.igncr,
            output: BITS.opost,
            control: BITS.cs7 | BITS.parenb | BITS.cstopb,
            local: BITS.icanon | BITS.echo | BITS.echoe | BITS.echok | BITS.echonl | BITS.isig | BITS.iexten,
        };

        let words = RegisterWords::pack(&image(OpenOptions::default(), Family::Bsd), &BITS)
            .merge_onto(current, &BITS);

        assert_eq!(words.input, 0);
        assert_eq!(words.output, 0);
        assert_eq!(words.control, BITS.clocal | BITS.cread | BITS.cs8);
        assert_eq!(words.local, 0);
    }

    #[test]
    fn merge_keeps_unmanaged_bits() {
        let managed = RegisterWords::managed(&BITS);
        let unmanaged = RegisterWords {
            input: !managed.input,
            output: !managed.output,
            control: !managed.control,
            local: !managed.local,
        };

        let packed = RegisterWords::pack(&image(OpenOptions::default(), Family::Bsd), &BITS);
        let words = packed.merge_onto(unmanaged, &BITS);

        assert_eq!(words.input, unmanaged.input | packed.input);
        assert_eq!(words.control, unmanaged.control | packed.control);
        assert_eq!(words.local, unmanaged.local);
    }
}
