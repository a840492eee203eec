/// Instruction codes for the page grammar.
///
/// The set below covers the legacy command list; ids outside it are still
/// structurally valid records and decode as opaque leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum InstrCode {
    Comment = 2,

    // Framing: each Begin* opens a node, the matching End* closes it.
    BeginPage = 9,
    EndPage = 10,
    BeginGroup = 13,
    BeginLayer = 14,
    EndLayer = 15,
    EndGroup = 16,
    BeginProcedure = 17,
    EndSection = 18,
    BeginTextStream = 20,
    EndTextStream = 21,
    BeginEmbedded = 22,
    EndEmbedded = 23,

    // Drawing leaves
    DrawChars = 65,
    Ellipse = 66,
    PolyCurve = 67,
    Rectangle = 68,
    DrawImage = 69,

    BeginTextObject = 70,
    EndTextObject = 71,
    BeginTextGroup = 72,
    EndTextGroup = 73,

    SetCharStyle = 85,
    SimpleWideText = 86,
    AddClippingRegion = 88,
    RemoveLastClippingRegion = 89,
    ClearClipping = 90,
    PushMappingMode = 91,
    PopMappingMode = 92,
    SetGlobalTransfo = 93,
    AddGlobalTransform = 94,
    RestoreLastGlobalTransfo = 95,

    TextFrame = 98,
    BeginParagraph = 99,
    EndParagraph = 100,
    CharInfo = 101,
    Characters = 102,
    PushTint = 103,
    PopTint = 104,

    JumpAbsolute = 111,
}

impl InstrCode {
    pub fn from_i16(v: i16) -> Option<Self> {
        match v {
            2 => Some(Self::Comment),
            9 => Some(Self::BeginPage),
            10 => Some(Self::EndPage),
            13 => Some(Self::BeginGroup),
            14 => Some(Self::BeginLayer),
            15 => Some(Self::EndLayer),
            16 => Some(Self::EndGroup),
            17 => Some(Self::BeginProcedure),
            18 => Some(Self::EndSection),
            20 => Some(Self::BeginTextStream),
            21 => Some(Self::EndTextStream),
            22 => Some(Self::BeginEmbedded),
            23 => Some(Self::EndEmbedded),
            65 => Some(Self::DrawChars),
            66 => Some(Self::Ellipse),
            67 => Some(Self::PolyCurve),
            68 => Some(Self::Rectangle),
            69 => Some(Self::DrawImage),
            70 => Some(Self::BeginTextObject),
            71 => Some(Self::EndTextObject),
            72 => Some(Self::BeginTextGroup),
            73 => Some(Self::EndTextGroup),
            85 => Some(Self::SetCharStyle),
            86 => Some(Self::SimpleWideText),
            88 => Some(Self::AddClippingRegion),
            89 => Some(Self::RemoveLastClippingRegion),
            90 => Some(Self::ClearClipping),
            91 => Some(Self::PushMappingMode),
            92 => Some(Self::PopMappingMode),
            93 => Some(Self::SetGlobalTransfo),
            94 => Some(Self::AddGlobalTransform),
            95 => Some(Self::RestoreLastGlobalTransfo),
            98 => Some(Self::TextFrame),
            99 => Some(Self::BeginParagraph),
            100 => Some(Self::EndParagraph),
            101 => Some(Self::CharInfo),
            102 => Some(Self::Characters),
            103 => Some(Self::PushTint),
            104 => Some(Self::PopTint),
            111 => Some(Self::JumpAbsolute),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Comment => "Comment",
            Self::BeginPage => "BeginPage",
            Self::EndPage => "EndPage",
            Self::BeginGroup => "BeginGroup",
            Self::BeginLayer => "BeginLayer",
            Self::EndLayer => "EndLayer",
            Self::EndGroup => "EndGroup",
            Self::BeginProcedure => "BeginProcedure",
            Self::EndSection => "EndSection",
            Self::BeginTextStream => "BeginTextStream",
            Self::EndTextStream => "EndTextStream",
            Self::BeginEmbedded => "BeginEmbedded",
            Self::EndEmbedded => "EndEmbedded",
            Self::DrawChars => "DrawChars",
            Self::Ellipse => "Ellipse",
            Self::PolyCurve => "PolyCurve",
            Self::Rectangle => "Rectangle",
            Self::DrawImage => "DrawImage",
            Self::BeginTextObject => "BeginTextObject",
            Self::EndTextObject => "EndTextObject",
            Self::BeginTextGroup => "BeginTextGroup",
            Self::EndTextGroup => "EndTextGroup",
            Self::SetCharStyle => "SetCharStyle",
            Self::SimpleWideText => "SimpleWideText",
            Self::AddClippingRegion => "AddClippingRegion",
            Self::RemoveLastClippingRegion => "RemoveLastClippingRegion",
            Self::ClearClipping => "ClearClipping",
            Self::PushMappingMode => "PushMappingMode",
            Self::PopMappingMode => "PopMappingMode",
            Self::SetGlobalTransfo => "SetGlobalTransfo",
            Self::AddGlobalTransform => "AddGlobalTransform",
            Self::RestoreLastGlobalTransfo => "RestoreLastGlobalTransfo",
            Self::TextFrame => "TextFrame",
            Self::BeginParagraph => "BeginParagraph",
            Self::EndParagraph => "EndParagraph",
            Self::CharInfo => "CharInfo",
            Self::Characters => "Characters",
            Self::PushTint => "PushTint",
            Self::PopTint => "PopTint",
            Self::JumpAbsolute => "JumpAbsolute",
        }
    }

    /// Whether this instruction opens a nested scope.
    pub fn opens_scope(self) -> bool {
        self.name().starts_with("Begin")
    }

    /// Whether this instruction closes the current scope.
    pub fn closes_scope(self) -> bool {
        self.name().starts_with("End")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_classification_follows_names() {
        assert!(InstrCode::BeginLayer.opens_scope());
        assert!(InstrCode::EndLayer.closes_scope());
        assert!(!InstrCode::PolyCurve.opens_scope());
        assert!(!InstrCode::PolyCurve.closes_scope());
        // Push/Pop mapping modes are leaves, not scopes.
        assert!(!InstrCode::PushMappingMode.opens_scope());
        assert!(!InstrCode::PopMappingMode.closes_scope());
    }

    #[test]
    fn round_trips_through_raw_value() {
        for v in i16::MIN..=i16::MAX {
            if let Some(code) = InstrCode::from_i16(v) {
                assert_eq!(code as i16, v);
            }
        }
    }
}
