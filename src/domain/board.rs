//! The 40-space board.
//!
//! Positions are cyclic: any integer maps onto the board modulo 40, so a
//! server position of 42 reads as space 2.

/// Number of spaces on the board.
pub const BOARD_SIZE: i32 = 40;

/// What kind of space a board index is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpaceKind {
    /// One of the four corners.
    Corner,
    /// A buildable street.
    Street,
    /// A railroad.
    Railroad,
    /// A utility company.
    Utility,
    /// Community chest draw.
    CommunityChest,
    /// Chance draw.
    Chance,
    /// A tax square.
    Tax,
}

/// One board space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardSpace {
    /// Index, 0..40.
    pub index: u8,
    /// Display name.
    pub name: &'static str,
    /// Kind.
    pub kind: SpaceKind,
    /// Color group for streets (`"brown"`, `"light_blue"`, ...).
    pub color_group: Option<&'static str>,
    /// Purchase price or tax amount.
    pub price: Option<i64>,
}

const fn space(
    index: u8,
    name: &'static str,
    kind: SpaceKind,
    color_group: Option<&'static str>,
    price: Option<i64>,
) -> BoardSpace {
    BoardSpace {
        index,
        name,
        kind,
        color_group,
        price,
    }
}

use SpaceKind::{Chance, CommunityChest, Corner, Railroad, Street, Tax, Utility};

/// Every space, in board order.
pub const BOARD_SPACES: [BoardSpace; 40] = [
    space(0, "Salida", Corner, None, None),
    space(1, "Avenida Mediterráneo", Street, Some("brown"), Some(60)),
    space(2, "Arca Comunal", CommunityChest, None, None),
    space(3, "Avenida Báltica", Street, Some("brown"), Some(60)),
    space(4, "Impuesto sobre Ingresos", Tax, None, Some(200)),
    space(5, "Ferrocarril Reading", Railroad, None, Some(200)),
    space(6, "Avenida Oriental", Street, Some("light_blue"), Some(100)),
    space(7, "Fortuna", Chance, None, None),
    space(8, "Avenida Vermont", Street, Some("light_blue"), Some(100)),
    space(9, "Avenida Connecticut", Street, Some("light_blue"), Some(120)),
    space(10, "En la Cárcel / De Visita", Corner, None, None),
    space(11, "Plaza San Carlos", Street, Some("pink"), Some(140)),
    space(12, "Compañía de Electricidad", Utility, None, Some(150)),
    space(13, "Avenida Estados", Street, Some("pink"), Some(140)),
    space(14, "Avenida Virginia", Street, Some("pink"), Some(160)),
    space(15, "Ferrocarril Pennsylvania", Railroad, None, Some(200)),
    space(16, "Plaza St. James", Street, Some("orange"), Some(180)),
    space(17, "Arca Comunal", CommunityChest, None, None),
    space(18, "Avenida Tennessee", Street, Some("orange"), Some(180)),
    space(19, "Avenida Nueva York", Street, Some("orange"), Some(200)),
    space(20, "Parada Libre", Corner, None, None),
    space(21, "Avenida Kentucky", Street, Some("red"), Some(220)),
    space(22, "Fortuna", Chance, None, None),
    space(23, "Avenida Indiana", Street, Some("red"), Some(220)),
    space(24, "Avenida Illinois", Street, Some("red"), Some(240)),
    space(25, "Ferrocarril B. & O.", Railroad, None, Some(200)),
    space(26, "Avenida Atlántico", Street, Some("yellow"), Some(260)),
    space(27, "Avenida Ventnor", Street, Some("yellow"), Some(260)),
    space(28, "Compañía de Agua", Utility, None, Some(150)),
    space(29, "Jardines Marvin", Street, Some("yellow"), Some(280)),
    space(30, "Váyase a la Cárcel", Corner, None, None),
    space(31, "Avenida Pacífico", Street, Some("green"), Some(300)),
    space(32, "Avenida Carolina del Norte", Street, Some("green"), Some(300)),
    space(33, "Arca Comunal", CommunityChest, None, None),
    space(34, "Avenida Pennsylvania", Street, Some("green"), Some(320)),
    space(35, "Ferrocarril Vía Rápida", Railroad, None, Some(200)),
    space(36, "Fortuna", Chance, None, None),
    space(37, "Plaza Park", Street, Some("dark_blue"), Some(350)),
    space(38, "Impuesto de Lujo", Tax, None, Some(100)),
    space(39, "El Muelle", Street, Some("dark_blue"), Some(400)),
];

/// Returns the space at a (cyclic) position.
#[must_use]
pub fn space_at(position: i32) -> &'static BoardSpace {
    let index = usize::try_from(position.rem_euclid(BOARD_SIZE)).unwrap_or(0);
    BOARD_SPACES.get(index).unwrap_or(&BOARD_SPACES[0])
}

/// Returns the display name of the space at a (cyclic) position.
#[must_use]
pub fn space_label(position: i32) -> &'static str {
    space_at(position).name
}

/// Returns the board indices of every street in a color group.
#[must_use]
pub fn group_positions(color_group: &str) -> Vec<u8> {
    BOARD_SPACES
        .iter()
        .filter(|s| s.color_group == Some(color_group))
        .map(|s| s.index)
        .collect()
}
