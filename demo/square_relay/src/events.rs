// Queue ids and event types shared by the mainapp and the gui

/// Queue drained by the mainapp
pub const MAINAPP_QUEUE: i32 = 1;
/// Queue drained by the gui
pub const GUI_QUEUE: i32 = 2;

/// Events handled on [`MAINAPP_QUEUE`]
pub mod mainapp {
    /// Stop the mainapp loop
    pub const QUIT_APP: u32 = 1;
    /// Square the signed int payload and answer with `gui::SQUARE_READY`
    pub const GET_SQUARE: u32 = 2;
}

/// Events handled on [`GUI_QUEUE`]
pub mod gui {
    /// Print the string payload
    pub const PRINT_TEXT: u32 = 1;
    pub const SQUARE_READY: u32 = 2;
}
